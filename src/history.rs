// history.rs

use std::collections::VecDeque;

pub const DEFAULT_HISTORY_SIZE: usize = 50;

/// Bounded FIFO of submitted commands with a recall cursor.
///
/// The cursor lives in `[0, len]`; `len` means "past the end", i.e. a new
/// command is being typed.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    capacity: usize,
    cursor: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn record(&mut self, command: impl Into<String>) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(command.into());
        self.cursor = self.entries.len();
    }

    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn recall_next(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn get(&self, n: usize) -> Option<&str> {
        self.entries.get(n).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// The last `n` entries with their 1-based positions, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = (usize, &str)> {
        let start = self.entries.len().saturating_sub(n);
        self.iter().enumerate().skip(start).map(|(i, e)| (i + 1, e))
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut history = CommandHistory::new();
        for i in 0..51 {
            history.record(format!("cmd{i}"));
        }
        assert_eq!(history.len(), 50);
        assert!(history.iter().all(|e| e != "cmd0"));
        assert_eq!(history.get(0), Some("cmd1"));
        assert_eq!(history.get(49), Some("cmd50"));
        assert_eq!(history.cursor(), 50);
    }

    #[test]
    fn recall_walks_back_and_forward() {
        let mut history = CommandHistory::new();
        history.record("a");
        history.record("b");
        history.record("c");

        assert_eq!(history.recall_previous(), Some("c"));
        assert_eq!(history.recall_previous(), Some("b"));
        assert_eq!(history.recall_previous(), Some("a"));
        assert_eq!(history.recall_previous(), None);
        assert_eq!(history.cursor(), 0);

        assert_eq!(history.recall_next(), Some("b"));
        assert_eq!(history.recall_next(), Some("c"));
        // Down never walks past the newest entry.
        assert_eq!(history.recall_next(), None);
        assert_eq!(history.cursor(), 2);
    }

    #[test]
    fn record_resets_cursor() {
        let mut history = CommandHistory::new();
        history.record("a");
        history.record("b");
        history.recall_previous();
        history.recall_previous();
        history.record("c");
        assert_eq!(history.cursor(), 3);
        assert_eq!(history.recall_previous(), Some("c"));
    }

    #[test]
    fn empty_history_is_inert() {
        let mut history = CommandHistory::new();
        assert_eq!(history.recall_previous(), None);
        assert_eq!(history.recall_next(), None);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn zero_capacity_keeps_one_entry() {
        let mut history = CommandHistory::with_capacity(0);
        history.record("a");
        history.record("b");
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn last_n_numbers_from_one() {
        let mut history = CommandHistory::new();
        for c in ["a", "b", "c"] {
            history.record(c);
        }
        let tail: Vec<_> = history.last_n(2).collect();
        assert_eq!(tail, vec![(2, "b"), (3, "c")]);
        assert_eq!(history.last_n(10).count(), 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Record(String),
        Previous,
        Next,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-z]{1,4}".prop_map(Op::Record),
            Just(Op::Previous),
            Just(Op::Next),
        ]
    }

    proptest! {
        #[test]
        fn cursor_stays_in_bounds(
            capacity in 1usize..8,
            ops in proptest::collection::vec(op_strategy(), 0..64)
        ) {
            let mut history = CommandHistory::with_capacity(capacity);
            for op in ops {
                match op {
                    Op::Record(c) => history.record(c),
                    Op::Previous => { history.recall_previous(); }
                    Op::Next => { history.recall_next(); }
                }
                prop_assert!(history.len() <= capacity);
                prop_assert!(history.cursor() <= history.len());
            }
        }
    }
}
