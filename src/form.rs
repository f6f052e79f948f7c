//! The console form: where submissions go, which type code they carry and
//! the editable text body.

use url::Url;

use crate::parser::PROMPT;

/// Type code for evaluating the body text.
pub const EVAL: &str = "eval";
/// Type code that asks the server to drop its console session.
pub const RESET: &str = "reset";

/// The editable input field. `caret` is a byte offset that always sits on a
/// char boundary.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InputField {
    text: String,
    caret: usize,
}

impl InputField {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = text.len();
        Self { text, caret }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Replace the whole content and move the caret to the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.caret = self.text.len();
    }

    pub fn append(&mut self, s: &str) {
        self.text.push_str(s);
        self.caret = self.text.len();
    }
}

impl Default for InputField {
    fn default() -> Self {
        Self::new(PROMPT)
    }
}

#[derive(Clone, Debug)]
pub struct ConsoleForm {
    pub action: Url,
    /// The type selector. `None` models a page whose form lacks the field.
    pub type_code: Option<String>,
    /// The text body. `None` models a page whose form lacks the field.
    pub body: Option<InputField>,
    pub focused: bool,
}

impl ConsoleForm {
    /// A complete form posting `eval` commands to `action`.
    pub fn new(action: Url) -> Self {
        Self {
            action,
            type_code: Some(EVAL.to_string()),
            body: Some(InputField::default()),
            focused: true,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.type_code.is_some() && self.body.is_some()
    }

    /// `<action>?c=<type>&s=<command>`
    pub fn submission_url(&self, type_code: &str, command: &str) -> Url {
        let mut url = self.action.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("c", type_code)
            .append_pair("s", command);
        url
    }

    /// `<action>?c=reset`
    pub fn reset_url(&self) -> Url {
        let mut url = self.action.clone();
        url.query_pairs_mut().clear().append_pair("c", RESET);
        url
    }

    /// Put the body back to a bare prompt and take focus.
    pub fn clear_input(&mut self) {
        if let Some(body) = self.body.as_mut() {
            body.set(PROMPT);
        }
        self.focused = true;
    }
}
