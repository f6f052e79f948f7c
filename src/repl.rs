// repl.rs

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::Receiver;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{
    Cmd, CompletionType, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler,
    ExternalPrinter, KeyCode, KeyEvent, Modifiers, Movement, RepeatCount,
};

use crate::builtins::{run_builtin, Flow, Session};
use crate::completion::ConsoleHelper;
use crate::config::ConsoleConfig;
use crate::console::Console;
use crate::keys::{self, Key, KeyOutcome, KeyPress};
use crate::parser::{normalize_input, split_meta_command, PROMPT};
use crate::transcript::{LineKind, Mark};
use crate::transport::{HttpTransport, Transport};
use crate::util::{strip_html_breaks, writeln_ignore_broken_pipe};

const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Feeds a line-editor key through [`keys::dispatch`] and writes the
/// resulting input back into the editor.
struct ConsoleKey {
    console: Arc<Mutex<Console>>,
    press: KeyPress,
}

impl ConditionalEventHandler for ConsoleKey {
    fn handle(&self, _evt: &Event, _n: RepeatCount, _positive: bool, ctx: &EventContext) -> Option<Cmd> {
        let mut console = self.console.lock().ok()?;
        console.set_input(ctx.line());
        match keys::dispatch(&mut console, self.press) {
            KeyOutcome::Handled => Some(match console.input() {
                Some(text) => Cmd::Replace(Movement::WholeBuffer, Some(text.to_owned())),
                None => Cmd::Noop,
            }),
            KeyOutcome::Ignored => None,
        }
    }
}

fn bind(rl: &mut Editor<ConsoleHelper, DefaultHistory>, console: &Arc<Mutex<Console>>, event: KeyEvent, press: KeyPress) {
    let handler = ConsoleKey {
        console: Arc::clone(console),
        press,
    };
    rl.bind_sequence(event, EventHandler::Conditional(Box::new(handler)));
}

/// Answers and errors appended since `mark`, ready for the terminal. The
/// line editor already shows what was typed, so commands and prompts are
/// skipped.
pub fn answers_since(console: &Console, mark: &mut Mark) -> Vec<String> {
    let transcript = console.transcript();
    let answers = transcript
        .since(*mark)
        .iter()
        .filter(|line| matches!(line.kind, LineKind::Response | LineKind::Error))
        .map(|line| strip_html_breaks(&line.text))
        .collect();
    *mark = transcript.mark();
    answers
}

/// Applies completions in the background and hands every new answer to
/// `emit`, so the prompt never waits on the server. Runs until `stop` fires
/// or is dropped.
pub fn spawn_answer_printer(
    console: Arc<Mutex<Console>>,
    mut emit: impl FnMut(String) + Send + 'static,
    stop: Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console-printer".to_string())
        .spawn(move || {
            let ticker = crossbeam_channel::tick(PUMP_INTERVAL);
            let mut mark = Mark::default();
            loop {
                crossbeam_channel::select! {
                    recv(stop) -> _ => break,
                    recv(ticker) -> _ => {
                        let answers = {
                            let Ok(mut console) = console.lock() else {
                                tracing::warn!("console state poisoned, printer exiting");
                                break;
                            };
                            console.pump();
                            answers_since(&console, &mut mark)
                        };
                        for answer in answers {
                            emit(answer);
                        }
                    },
                }
            }
        })
}

pub fn start_repl(config: ConsoleConfig) -> anyhow::Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.timeout()));
    let form = config.console_form().context("building console form")?;
    let console = Arc::new(Mutex::new(Console::new(
        form,
        Arc::clone(&transport),
        config.history_size,
    )));
    let mut session = Session::new(Arc::clone(&console), transport, config);

    let rl_config = Config::builder().completion_type(CompletionType::List).build();
    let mut rl: Editor<ConsoleHelper, DefaultHistory> =
        Editor::with_config(rl_config).context("creating line editor")?;
    rl.set_helper(Some(ConsoleHelper::new()));
    bind(&mut rl, &console, KeyEvent(KeyCode::Up, Modifiers::NONE), KeyPress::plain(Key::Up));
    bind(&mut rl, &console, KeyEvent(KeyCode::Down, Modifiers::NONE), KeyPress::plain(Key::Down));
    // Few terminals report Ctrl-Enter, so Alt-Enter does the same job.
    bind(&mut rl, &console, KeyEvent(KeyCode::Enter, Modifiers::CTRL), KeyPress::ctrl(Key::Enter));
    bind(&mut rl, &console, KeyEvent(KeyCode::Enter, Modifiers::ALT), KeyPress::ctrl(Key::Enter));

    let emit: Box<dyn FnMut(String) + Send> = match rl.create_external_printer() {
        Ok(mut printer) => Box::new(move |answer: String| {
            if let Err(e) = printer.print(answer) {
                tracing::warn!(error = %e, "printing answer");
            }
        }),
        Err(e) => {
            tracing::debug!(error = %e, "no external printer, writing answers to stdout");
            Box::new(|answer: String| {
                let _ = writeln_ignore_broken_pipe(std::io::stdout(), answer);
            })
        }
    };
    let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
    let printer = spawn_answer_printer(Arc::clone(&console), emit, stop_rx)
        .context("starting answer printer")?;

    loop {
        let initial = session.console()?.input().unwrap_or(PROMPT).to_string();

        match rl.readline_with_initial("", (&initial, "")) {
            Ok(line) => {
                let normalized = normalize_input(&line);
                if let Some((name, args)) = split_meta_command(&normalized.command) {
                    let mut confirm = |question: &str| {
                        matches!(
                            rl.readline(&format!("{question} [y/N] ")),
                            Ok(answer) if answer.trim().eq_ignore_ascii_case("y")
                        )
                    };
                    let flow = run_builtin(&mut session, name, args, &mut std::io::stdout(), &mut confirm);
                    session.console()?.form_mut().clear_input();
                    match flow {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => {
                            tracing::warn!(error = ?e, "builtin failed");
                            let _ = writeln_ignore_broken_pipe(std::io::stderr(), format!("Error: {e:#}"));
                        }
                    }
                    continue;
                }

                let mut console = session.console()?;
                console.set_input(line);
                keys::dispatch(&mut console, KeyPress::plain(Key::Enter));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = stop_tx.send(());
    if printer.join().is_err() {
        tracing::warn!("answer printer panicked");
    }
    Ok(())
}
