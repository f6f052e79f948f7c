// util.rs

pub fn writeln_ignore_broken_pipe<W: std::io::Write, S: AsRef<str>>(mut w: W, s: S) -> std::io::Result<()> {
    match writeln!(w, "{}", s.as_ref()) {
        Err(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// The console endpoint turns newlines into `<br />\n` for the web page;
/// a terminal only wants the newlines.
pub fn strip_html_breaks(s: &str) -> String {
    s.replace("<br />\n", "\n").replace("<br />", "\n")
}
