//! Keyboard dispatch for the console input.

use crate::console::Console;
use crate::parser::PROMPT;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    Enter,
    Up,
    Down,
    Char(char),
    Other,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    pub fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyOutcome {
    /// The console consumed the key: suppress the default action and stop
    /// propagation.
    Handled,
    /// Not a console key, leave it to the host.
    Ignored,
}

pub fn dispatch(console: &mut Console, press: KeyPress) -> KeyOutcome {
    match (press.key, press.ctrl) {
        // Ctrl-M is the same keystroke as Enter on most terminals.
        (Key::Enter, true) | (Key::Char('m' | 'M'), true) => {
            // Consumed even without a body, so the host never submits on it.
            if let Some(body) = console.form_mut().body.as_mut() {
                body.append("\n");
            }
            KeyOutcome::Handled
        }
        (Key::Enter, false) => {
            console.submit();
            KeyOutcome::Handled
        }
        (Key::Up, _) => {
            let recalled = console.history_mut().recall_previous().map(str::to_owned);
            write_recalled(console, recalled);
            KeyOutcome::Handled
        }
        (Key::Down, _) => {
            let recalled = console.history_mut().recall_next().map(str::to_owned);
            write_recalled(console, recalled);
            KeyOutcome::Handled
        }
        _ => KeyOutcome::Ignored,
    }
}

fn write_recalled(console: &mut Console, recalled: Option<String>) {
    if let Some(command) = recalled {
        console.set_input(format!("{PROMPT}{command}"));
        console.form_mut().focused = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ConsoleForm;
    use crate::testing::RecordingTransport;
    use crate::transcript::LineKind;
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    fn console(transport: &RecordingTransport) -> Console {
        let action = Url::parse("http://localhost:8001/emissary/Console.action").unwrap();
        Console::new(ConsoleForm::new(action), Arc::new(transport.clone()), 50)
    }

    fn submit(console: &mut Console, text: &str) {
        console.set_input(text);
        assert_eq!(
            dispatch(console, KeyPress::plain(Key::Enter)),
            KeyOutcome::Handled
        );
    }

    #[test]
    fn ctrl_enter_inserts_newline() {
        let transport = RecordingTransport::new();
        let mut console = console(&transport);
        console.set_input("=> def f");
        assert_eq!(
            dispatch(&mut console, KeyPress::ctrl(Key::Enter)),
            KeyOutcome::Handled
        );
        assert_eq!(
            dispatch(&mut console, KeyPress::ctrl(Key::Char('m'))),
            KeyOutcome::Handled
        );
        assert_eq!(console.input(), Some("=> def f\n\n"));
        assert!(console.transcript().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn enter_submits() {
        let transport = RecordingTransport::new();
        let mut console = console(&transport);
        submit(&mut console, "=> 1 + 1");
        assert!(console.wait_idle(Duration::from_secs(5)));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(console.transcript().count(LineKind::Command), 1);
    }

    #[test]
    fn arrows_recall_with_prompt_and_caret_at_end() {
        let transport = RecordingTransport::new();
        let mut console = console(&transport);
        submit(&mut console, "=> first");
        submit(&mut console, "=> second");

        assert_eq!(dispatch(&mut console, KeyPress::plain(Key::Up)), KeyOutcome::Handled);
        assert_eq!(console.input(), Some("=> second"));
        dispatch(&mut console, KeyPress::plain(Key::Up));
        assert_eq!(console.input(), Some("=> first"));
        let body = console.form().body.as_ref().unwrap();
        assert_eq!(body.caret(), body.text().len());

        // At the oldest entry Up is still consumed but changes nothing.
        assert_eq!(dispatch(&mut console, KeyPress::plain(Key::Up)), KeyOutcome::Handled);
        assert_eq!(console.input(), Some("=> first"));

        dispatch(&mut console, KeyPress::plain(Key::Down));
        assert_eq!(console.input(), Some("=> second"));
        dispatch(&mut console, KeyPress::plain(Key::Down));
        assert_eq!(console.input(), Some("=> second"));
        assert!(console.wait_idle(Duration::from_secs(5)));
    }

    #[test]
    fn other_keys_are_ignored() {
        let transport = RecordingTransport::new();
        let mut console = console(&transport);
        assert_eq!(
            dispatch(&mut console, KeyPress::plain(Key::Char('a'))),
            KeyOutcome::Ignored
        );
        assert_eq!(dispatch(&mut console, KeyPress::plain(Key::Other)), KeyOutcome::Ignored);
        assert_eq!(console.input(), Some(PROMPT));
    }

    #[test]
    fn ctrl_enter_without_body_is_still_consumed() {
        let transport = RecordingTransport::new();
        let mut console = console(&transport);
        console.form_mut().body = None;
        for press in [KeyPress::ctrl(Key::Enter), KeyPress::ctrl(Key::Char('m'))] {
            assert_eq!(dispatch(&mut console, press), KeyOutcome::Handled);
        }
        assert_eq!(console.input(), None);
        assert!(transport.requests().is_empty());
        assert!(console.transcript().is_empty());
    }
}
