//! The console's output area.

use std::fmt;

use itertools::Itertools;

use crate::parser::PROMPT;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineKind {
    Command,
    Response,
    Error,
    Prompt,
}

impl LineKind {
    /// CSS class the console page styles each kind with.
    pub fn css_class(self) -> &'static str {
        match self {
            LineKind::Command => "commandtext",
            LineKind::Response => "responsetext",
            LineKind::Error => "errortext",
            LineKind::Prompt => "prompttext",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineKind::Command => "command",
            LineKind::Response => "response",
            LineKind::Error => "error",
            LineKind::Prompt => "prompt",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

/// Position in a transcript, used to pick up only the lines appended since.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Mark {
    epoch: u64,
    len: usize,
}

/// Append-only list of rendered lines.
///
/// The only way lines disappear is [`Transcript::clear`], which bumps the
/// epoch so that a stale [`Mark`] starts over from the first line.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<Line>,
    epoch: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: LineKind, text: impl Into<String>) {
        let text = text.into();
        tracing::trace!(%kind, %text, "transcript line");
        self.lines.push(Line { kind, text });
    }

    pub fn push_prompt(&mut self) {
        self.push(LineKind::Prompt, PROMPT);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.epoch += 1;
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }

    pub fn mark(&self) -> Mark {
        Mark {
            epoch: self.epoch,
            len: self.lines.len(),
        }
    }

    /// Lines appended after `mark`, or every line if a clear happened since.
    pub fn since(&self, mark: Mark) -> &[Line] {
        if mark.epoch != self.epoch || mark.len > self.lines.len() {
            &self.lines
        } else {
            &self.lines[mark.len..]
        }
    }

    /// Render as HTML spans. Prompt spans run into the command that follows
    /// them, every other line ends with a `<br />`.
    pub fn render_html(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                let span = format!(
                    "<span class=\"{}\">{}</span>",
                    line.kind.css_class(),
                    escape_html(&line.text)
                );
                match line.kind {
                    LineKind::Prompt => span,
                    _ => format!("{span}<br />\n"),
                }
            })
            .join("")
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_escapes_server_text() {
        let mut transcript = Transcript::new();
        transcript.push(LineKind::Response, "<script>alert('x') & \"y\"</script>");
        let html = transcript.render_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"));
        assert!(html.starts_with("<span class=\"responsetext\">"));
        assert!(html.ends_with("</span><br />\n"));
    }

    #[test]
    fn prompt_runs_into_command() {
        let mut transcript = Transcript::new();
        transcript.push_prompt();
        transcript.push(LineKind::Command, "ls");
        assert_eq!(
            transcript.render_html(),
            "<span class=\"prompttext\">=&gt; </span><span class=\"commandtext\">ls</span><br />\n"
        );
    }

    #[test]
    fn since_mark_tracks_appends_and_clears() {
        let mut transcript = Transcript::new();
        transcript.push(LineKind::Command, "a");
        let mark = transcript.mark();
        transcript.push(LineKind::Response, "b");
        assert_eq!(transcript.since(mark).len(), 1);
        assert_eq!(transcript.since(mark)[0].text, "b");

        transcript.clear();
        transcript.push(LineKind::Error, "Console reset");
        let fresh = transcript.since(mark);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].kind, LineKind::Error);
    }

    #[test]
    fn count_by_kind() {
        let mut transcript = Transcript::new();
        transcript.push(LineKind::Error, "x");
        transcript.push(LineKind::Command, "y");
        transcript.push(LineKind::Error, "z");
        assert_eq!(transcript.count(LineKind::Error), 2);
        assert_eq!(transcript.count(LineKind::Prompt), 0);
    }
}
