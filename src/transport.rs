//! Request/response exchange with the server.

use std::time::Duration;

use url::Url;

use crate::error::TransportError;

/// Header the server's CSRF filter expects on state-changing requests.
pub const CLIENT_HEADER: &str = "X-Requested-By";
pub const CLIENT_NAME: &str = "emissary-console";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Post => "POST",
        }
    }

    /// Everything but GET/HEAD/OPTIONS carries [`CLIENT_HEADER`].
    pub fn carries_client_header(self) -> bool {
        !matches!(self, Method::Get | Method::Head | Method::Options)
    }
}

/// One blocking exchange. Implementations must be shareable across the
/// worker threads the console spawns per request.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, method: Method, url: &Url) -> Result<String, TransportError>;

    fn get(&self, url: &Url) -> Result<String, TransportError> {
        self.send(Method::Get, url)
    }

    fn post(&self, url: &Url) -> Result<String, TransportError> {
        self.send(Method::Post, url)
    }
}

pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl Transport for HttpTransport {
    #[tracing::instrument(skip(self), fields(url = %url))]
    fn send(&self, method: Method, url: &Url) -> Result<String, TransportError> {
        let mut request = self.agent.request(method.as_str(), url.as_str());
        if method.carries_client_header() {
            request = request.set(CLIENT_HEADER, CLIENT_NAME);
        }
        match request.call() {
            Ok(response) => {
                tracing::debug!(status = response.status(), "response received");
                response.into_string().map_err(TransportError::Body)
            }
            Err(ureq::Error::Status(code, _)) => {
                tracing::debug!(code, "server rejected request");
                Err(TransportError::Status { code })
            }
            Err(ureq::Error::Transport(e)) => {
                tracing::debug!(error = %e, "request failed");
                Err(TransportError::Transport(e.to_string()))
            }
        }
    }
}
