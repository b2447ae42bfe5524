//! Error types for HTTP collaborator calls.

use thiserror::Error;

/// Errors from fetching images, segmenting or submitting.
#[derive(Error, Debug)]
pub enum HttpError {
    /// Connection, DNS, TLS or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("HTTP {code}: {body}")]
    Status {
        /// Status code
        code: u16,
        /// Response body, as text
        body: String,
    },

    /// Response body was not the expected payload
    #[error("Malformed response: {0}")]
    Decode(String),

    /// I/O error while reading a response
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    /// Status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ureq::Error> for HttpError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => HttpError::Status {
                code,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => HttpError::Transport(transport.to_string()),
        }
    }
}
