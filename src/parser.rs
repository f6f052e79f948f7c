// parser.rs

/// Marker the console input starts with when it is ready for a command.
pub const PROMPT: &str = "=> ";

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Normalized {
    pub command: String,
    /// The input started with [`PROMPT`] and it was removed.
    pub had_prompt: bool,
}

/// Strip a single trailing newline, then a single leading prompt marker.
pub fn normalize_input(input: &str) -> Normalized {
    let chomped = input.strip_suffix('\n').unwrap_or(input);
    match chomped.strip_prefix(PROMPT) {
        Some(rest) => Normalized {
            command: rest.to_string(),
            had_prompt: true,
        },
        None => Normalized {
            command: chomped.to_string(),
            had_prompt: false,
        },
    }
}

/// Split a `:meta` command line into its name and the (trimmed) rest.
/// Returns `None` for lines that should go to the server.
pub fn split_meta_command(command: &str) -> Option<(&str, &str)> {
    let rest = command.trim().strip_prefix(':')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().filter(|n| !n.is_empty())?;
    let args = parts.next().unwrap_or("").trim();
    Some((name, args))
}
