//! The console widget: submission flow, reset and the transcript it feeds.
//!
//! Requests are fire-and-forget. Each one runs on its own worker thread and
//! reports back over a channel; the owner applies the results to the
//! transcript by calling [`Console::pump`] or [`Console::wait_idle`]. Results
//! are applied in arrival order, so overlapping submissions can be answered
//! out of order.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use url::Url;

use crate::error::TransportError;
use crate::form::ConsoleForm;
use crate::history::CommandHistory;
use crate::parser::normalize_input;
use crate::transcript::{LineKind, Transcript};
use crate::transport::Transport;

pub const FORM_SETUP_ERROR: &str = "Error in form setup!!!";
pub const REQUEST_FAILED: &str = "Error!!!";
pub const RESET_NOTICE: &str = "Console reset";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Submission {
    /// The form was incomplete; nothing was sent.
    Rejected,
    Dispatched(RequestId),
}

#[derive(Clone, Copy, Debug)]
enum RequestKind {
    Command,
    Reset,
}

struct Completion {
    id: RequestId,
    kind: RequestKind,
    outcome: Result<String, TransportError>,
}

pub struct Console {
    form: ConsoleForm,
    history: CommandHistory,
    transcript: Transcript,
    transport: Arc<dyn Transport>,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    in_flight: usize,
    next_id: u64,
}

impl Console {
    pub fn new(form: ConsoleForm, transport: Arc<dyn Transport>, history_size: usize) -> Self {
        let (completions_tx, completions_rx) = crossbeam_channel::unbounded();
        Self {
            form,
            history: CommandHistory::with_capacity(history_size),
            transcript: Transcript::new(),
            transport,
            completions_tx,
            completions_rx,
            in_flight: 0,
            next_id: 0,
        }
    }

    /// Run the submission flow on the current form contents.
    #[tracing::instrument(skip(self))]
    pub fn submit(&mut self) -> Submission {
        let (Some(type_code), Some(body)) = (self.form.type_code.clone(), self.form.body.as_ref())
        else {
            tracing::warn!("console form is missing its type or body field");
            self.transcript.push(LineKind::Error, FORM_SETUP_ERROR);
            return Submission::Rejected;
        };

        let normalized = normalize_input(body.text());
        if normalized.had_prompt {
            self.transcript.push_prompt();
        }
        self.history.record(normalized.command.clone());
        self.transcript.push(LineKind::Command, normalized.command.clone());

        let url = self.form.submission_url(&type_code, &normalized.command);
        let id = self.dispatch(url, RequestKind::Command);
        tracing::debug!(%id, command = %normalized.command, "command dispatched");

        self.form.clear_input();
        Submission::Dispatched(id)
    }

    /// Ask the server to drop its session and start the transcript over.
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self) -> RequestId {
        let id = self.dispatch(self.form.reset_url(), RequestKind::Reset);
        tracing::debug!(%id, "reset dispatched");
        self.transcript.clear();
        self.transcript.push(LineKind::Error, RESET_NOTICE);
        self.form.clear_input();
        id
    }

    /// Empty the output area without telling the server.
    pub fn clear_output(&mut self) {
        self.transcript.clear();
        self.form.focused = true;
    }

    /// Apply every completion that has already arrived. Never blocks.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Block until no request is outstanding or `timeout` elapses.
    /// Returns whether the console went idle. A timeout too large to add to
    /// the current instant means no deadline.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        while self.in_flight > 0 {
            let received = match deadline {
                Some(deadline) => self
                    .completions_rx
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .completions_rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(completion) => self.apply(completion),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!(in_flight = self.in_flight, "timed out waiting for responses");
                    return false;
                }
                // Unreachable while we hold the sender, treat as idle.
                Err(RecvTimeoutError::Disconnected) => return true,
            }
        }
        true
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    pub fn form(&self) -> &ConsoleForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ConsoleForm {
        &mut self.form
    }

    /// Current body text, or `None` when the form has no body field.
    pub fn input(&self) -> Option<&str> {
        self.form.body.as_ref().map(|b| b.text())
    }

    /// Replace the body text; ignored when the form has no body field.
    pub fn set_input(&mut self, text: impl Into<String>) {
        if let Some(body) = self.form.body.as_mut() {
            body.set(text);
        }
    }

    fn dispatch(&mut self, url: Url, kind: RequestKind) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.in_flight += 1;

        let transport = Arc::clone(&self.transport);
        let tx = self.completions_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("console-request-{}", id.0))
            .spawn(move || {
                let outcome = transport.post(&url);
                // The console may already be gone; nobody is left to tell.
                let _ = tx.send(Completion { id, kind, outcome });
            });
        if let Err(e) = spawned {
            tracing::warn!(%id, error = %e, "could not start request thread");
            let _ = self.completions_tx.send(Completion {
                id,
                kind,
                outcome: Err(TransportError::Transport(e.to_string())),
            });
        }
        id
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completion { id, kind, outcome } = completion;
        match (kind, outcome) {
            (RequestKind::Command, Ok(body)) => {
                tracing::debug!(%id, bytes = body.len(), "command answered");
                self.transcript.push(LineKind::Response, body);
            }
            (RequestKind::Command, Err(e)) => {
                tracing::warn!(%id, error = %e, "command failed");
                self.transcript.push(LineKind::Error, REQUEST_FAILED);
            }
            (RequestKind::Reset, Ok(_)) => tracing::debug!(%id, "reset acknowledged"),
            (RequestKind::Reset, Err(e)) => tracing::warn!(%id, error = %e, "reset failed"),
        }
    }
}
