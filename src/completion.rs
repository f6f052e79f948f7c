// completion.rs

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

use crate::builtins::BUILTINS;
use crate::parser::PROMPT;

/// Completes `:` meta-commands; everything else is server input and is
/// left alone.
pub struct ConsoleHelper;

impl ConsoleHelper {
    pub fn new() -> Self {
        Self
    }

    pub fn candidates(line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let before = &line[..pos];
        let offset = if before.starts_with(PROMPT) { PROMPT.len() } else { 0 };
        let typed = &before[offset..];
        let Some(prefix) = typed.strip_prefix(':') else {
            return (pos, Vec::new());
        };
        if prefix.contains(char::is_whitespace) {
            return (pos, Vec::new());
        }
        let mut names: Vec<&str> = BUILTINS
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        let pairs = names
            .into_iter()
            .map(|n| Pair {
                display: format!(":{n}"),
                replacement: format!(":{n} "),
            })
            .collect();
        (offset, pairs)
    }
}

impl Default for ConsoleHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for ConsoleHelper {
    type Candidate = Pair;
    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>), ReadlineError> {
        Ok(Self::candidates(line, pos))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ConsoleHelper {}

impl Validator for ConsoleHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> Result<ValidationResult, ReadlineError> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for ConsoleHelper {}
