// builtins.rs
//
// `:` commands handled locally instead of being sent to the server.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context};

use crate::config::ConsoleConfig;
use crate::console::Console;
use crate::nav::{self, Confirm, NavBar, NavPayload};
use crate::transport::Transport;
use crate::util::{strip_html_breaks, writeln_ignore_broken_pipe};
use crate::version;

pub const BUILTINS: &[(&str, &str)] = &[
    ("help", "list the local commands"),
    ("history", "show submitted commands, optionally only the last N"),
    ("clear", "clear the output"),
    ("reset", "reset the server console session"),
    ("nav", "show the server's navigation bar"),
    ("go", "follow a navigation link or action by label"),
    ("version", "show the version reported by each node"),
    ("quit", "leave the console"),
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything a builtin may touch.
pub struct Session {
    pub console: Arc<Mutex<Console>>,
    pub transport: Arc<dyn Transport>,
    pub config: ConsoleConfig,
    nav: Option<NavPayload>,
}

impl Session {
    pub fn new(console: Arc<Mutex<Console>>, transport: Arc<dyn Transport>, config: ConsoleConfig) -> Self {
        Self {
            console,
            transport,
            config,
            nav: None,
        }
    }

    pub fn console(&self) -> anyhow::Result<MutexGuard<'_, Console>> {
        self.console
            .lock()
            .map_err(|_| anyhow!("console state poisoned by a panicked thread"))
    }

    fn nav_bar(&mut self) -> anyhow::Result<NavBar> {
        let payload = match self.nav.take() {
            Some(payload) => payload,
            None => {
                let url = self.config.nav_url().context("building nav url")?;
                nav::fetch(self.transport.as_ref(), &url).context("fetching navigation")?
            }
        };
        let bar = match &payload {
            NavPayload::Descriptor(d) => Some(NavBar::build(d.clone(), &self.config.console_path)),
            NavPayload::Fragment(_) => None,
        };
        self.nav = Some(payload);
        bar.ok_or_else(|| anyhow!("the server only provides a prebuilt nav fragment"))
    }
}

pub fn run_builtin(
    session: &mut Session,
    name: &str,
    args: &str,
    out: &mut impl Write,
    confirm: &mut impl Confirm,
) -> anyhow::Result<Flow> {
    tracing::debug!(name, args, "running builtin");
    match name {
        "quit" | "exit" => return Ok(Flow::Quit),
        "help" => {
            for (name, about) in BUILTINS {
                writeln_ignore_broken_pipe(&mut *out, format!("  :{name:<8} {about}"))?;
            }
        }
        "history" => {
            let console = session.console()?;
            let history = console.history();
            let n = if args.is_empty() {
                history.len()
            } else {
                args.parse::<usize>()
                    .with_context(|| format!("history: {args}: numeric argument required"))?
            };
            for (i, cmd) in history.last_n(n) {
                writeln_ignore_broken_pipe(&mut *out, format!("{:>5}  {}", i, cmd))?;
            }
        }
        "clear" => session.console()?.clear_output(),
        "reset" => {
            session.console()?.reset();
        }
        "nav" => {
            // Always refetch on an explicit request.
            session.nav = None;
            match session.nav_bar() {
                Ok(bar) => write!(out, "{}", bar.render_plain())?,
                Err(_) => match &session.nav {
                    Some(NavPayload::Fragment(html)) => writeln_ignore_broken_pipe(&mut *out, html)?,
                    _ => return Err(anyhow!("navigation unavailable")),
                },
            }
        }
        "go" => {
            if args.is_empty() {
                writeln_ignore_broken_pipe(&mut *out, "go: missing label")?;
                return Ok(Flow::Continue);
            }
            let bar = session.nav_bar()?;
            if bar.find(args).is_none() {
                writeln_ignore_broken_pipe(&mut *out, format!("go: {args}: no such link"))?;
                return Ok(Flow::Continue);
            }
            let Some(href) = bar.activate(args, confirm) else {
                writeln_ignore_broken_pipe(&mut *out, "cancelled")?;
                return Ok(Flow::Continue);
            };
            let url = session
                .config
                .resolve_path(href)
                .with_context(|| format!("resolving {href}"))?;
            let body = session
                .transport
                .get(&url)
                .with_context(|| format!("following {url}"))?;
            writeln_ignore_broken_pipe(&mut *out, strip_html_breaks(&body))?;
        }
        "version" => {
            let url = session.config.version_url().context("building version url")?;
            let report = version::fetch(session.transport.as_ref(), &url).context("fetching version")?;
            for (node, version) in &report.nodes {
                writeln_ignore_broken_pipe(&mut *out, format!("{node}  {version}"))?;
            }
        }
        other => {
            writeln_ignore_broken_pipe(&mut *out, format!(":{other}: unknown command, try :help"))?;
        }
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use crate::transcript::LineKind;
    use crate::transport::Method;
    use std::time::Duration;

    const NAV: &str = r#"{"appName":"Emissary","appVersion":"8.0.0",
        "navItems":{"Console":"/emissary/Console.action","Agents":"/api/agents"},
        "navButtons":{"Shutdown":"/api/shutdown"}}"#;

    fn session(transport: &RecordingTransport) -> Session {
        let config = ConsoleConfig::default();
        let transport: Arc<dyn Transport> = Arc::new(transport.clone());
        let console = Console::new(config.console_form().unwrap(), transport.clone(), 50);
        Session::new(Arc::new(Mutex::new(console)), transport, config)
    }

    fn run(session: &mut Session, name: &str, args: &str, answer: bool) -> (Flow, String) {
        let mut out = Vec::new();
        let mut confirm = |_: &str| answer;
        let flow = run_builtin(session, name, args, &mut out, &mut confirm).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn quit_stops() {
        let transport = RecordingTransport::new();
        let mut session = session(&transport);
        assert_eq!(run(&mut session, "quit", "", false).0, Flow::Quit);
    }

    #[test]
    fn history_lists_last_n() {
        let transport = RecordingTransport::new();
        let mut session = session(&transport);
        {
            let mut console = session.console().unwrap();
            for cmd in ["a", "b", "c"] {
                console.history_mut().record(cmd);
            }
        }
        let (_, out) = run(&mut session, "history", "2", false);
        assert_eq!(out, "    2  b\n    3  c\n");

        let mut sink = Vec::new();
        let mut confirm = |_: &str| false;
        assert!(run_builtin(&mut session, "history", "x", &mut sink, &mut confirm).is_err());
    }

    #[test]
    fn reset_posts_and_rewrites_transcript() {
        let transport = RecordingTransport::new();
        let mut session = session(&transport);
        run(&mut session, "reset", "", false);
        let mut console = session.console().unwrap();
        assert!(console.wait_idle(Duration::from_secs(5)));
        assert_eq!(console.transcript().count(LineKind::Error), 1);
        assert_eq!(transport.requests()[0].param("c").as_deref(), Some("reset"));
    }

    #[test]
    fn nav_marks_console_page() {
        let transport = RecordingTransport::new();
        transport.reply_ok(NAV);
        let mut session = session(&transport);
        let (_, out) = run(&mut session, "nav", "", false);
        assert!(out.starts_with("Emissary 8.0.0\n"));
        assert!(out.contains("* Console -> /emissary/Console.action"));
        assert!(out.contains("  Shutdown [action] -> /api/shutdown"));
    }

    #[test]
    fn go_declined_sends_nothing() {
        let transport = RecordingTransport::new();
        transport.reply_ok(NAV);
        let mut session = session(&transport);
        let (_, out) = run(&mut session, "go", "Shutdown", false);
        assert_eq!(out, "cancelled\n");
        // Only the nav fetch went out.
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn go_confirmed_follows_link() {
        let transport = RecordingTransport::new();
        transport.reply_ok(NAV).reply_ok("Shutting down<br />\nbye");
        let mut session = session(&transport);
        let (_, out) = run(&mut session, "go", "Shutdown", true);
        assert_eq!(out, "Shutting down\nbye\n");
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::Get);
        assert_eq!(requests[1].url.path(), "/api/shutdown");
    }

    #[test]
    fn go_reuses_fetched_nav() {
        let transport = RecordingTransport::new();
        transport.reply_ok(NAV).reply_ok("agents").reply_ok("agents again");
        let mut session = session(&transport);
        run(&mut session, "go", "Agents", false);
        run(&mut session, "go", "Agents", false);
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn go_unknown_label() {
        let transport = RecordingTransport::new();
        transport.reply_ok(NAV);
        let mut session = session(&transport);
        let (_, out) = run(&mut session, "go", "Nope", true);
        assert_eq!(out, "go: Nope: no such link\n");
    }

    #[test]
    fn fragment_nav_is_printed_verbatim() {
        let transport = RecordingTransport::new();
        transport.reply_ok("<nav>old</nav>");
        let mut session = session(&transport);
        let (_, out) = run(&mut session, "nav", "", false);
        assert_eq!(out, "<nav>old</nav>\n");
    }

    #[test]
    fn version_lists_nodes() {
        let transport = RecordingTransport::new();
        transport.reply_ok(r#"{"response":{"localhost:8001":"8.0.0"}}"#);
        let mut session = session(&transport);
        let (_, out) = run(&mut session, "version", "", false);
        assert_eq!(out, "localhost:8001  8.0.0\n");
    }

    #[test]
    fn unknown_builtin_is_reported() {
        let transport = RecordingTransport::new();
        let mut session = session(&transport);
        let (flow, out) = run(&mut session, "frobnicate", "", false);
        assert_eq!(flow, Flow::Continue);
        assert!(out.contains("unknown command"));
    }
}
