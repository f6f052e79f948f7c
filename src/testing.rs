//! Testing utilities: an in-memory [`Transport`] that records every request.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use url::Url;

use crate::error::TransportError;
use crate::transport::{Method, Transport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
}

impl RecordedRequest {
    /// Value of query parameter `key`, decoded.
    pub fn param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

#[derive(Default)]
struct Inner {
    requests: Vec<RecordedRequest>,
    replies: VecDeque<Result<String, u16>>,
}

/// Records requests and answers them from a queue of canned replies.
/// When the queue is empty every request succeeds with an empty body.
///
/// Cloning shares the same record, so a test can keep one handle while the
/// console owns another.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_ok(&self, body: impl Into<String>) -> &Self {
        self.lock().replies.push_back(Ok(body.into()));
        self
    }

    /// Queue a non-2xx answer.
    pub fn reply_status(&self, code: u16) -> &Self {
        self.lock().replies.push_back(Err(code));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the record from the others.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for RecordingTransport {
    fn send(&self, method: Method, url: &Url) -> Result<String, TransportError> {
        let mut inner = self.lock();
        inner.requests.push(RecordedRequest {
            method,
            url: url.clone(),
        });
        match inner.replies.pop_front() {
            None => Ok(String::new()),
            Some(Ok(body)) => Ok(body),
            Some(Err(code)) => Err(TransportError::Status { code }),
        }
    }
}
