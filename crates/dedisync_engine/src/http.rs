//! HTTP client abstraction for the external lookup services.
//!
//! The engine only ever issues GET requests, optionally with a bearer
//! token. The client is a trait so tests never touch the network.

use std::io::Read;
use std::time::Duration;
use thiserror::Error;

/// Errors from an HTTP fetch.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
}

/// The HTTP surface the engine needs.
///
/// Implement this to provide the actual HTTP stack; [`UreqClient`] is the
/// production implementation.
pub trait HttpClient: Send + Sync {
    /// Issues a GET and returns the response body of a success response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Status`] for a non-success response and
    /// [`HttpError::Transport`] when no response was obtained.
    fn get(&self, url: &str, bearer: Option<&str>) -> Result<Vec<u8>, HttpError>;
}

/// Blocking HTTP client with a per-request timeout.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Creates a client whose every request is bounded by `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str, bearer: Option<&str>) -> Result<Vec<u8>, HttpError> {
        let mut request = self.agent.get(url).set("User-Agent", "dedisync");
        if let Some(token) = bearer {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        match request.call() {
            Ok(response) => {
                let mut body = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut body)
                    .map_err(|e| HttpError::Transport(e.to_string()))?;
                Ok(body)
            }
            Err(ureq::Error::Status(code, _)) => Err(HttpError::Status(code)),
            Err(err) => Err(HttpError::Transport(err.to_string())),
        }
    }
}
