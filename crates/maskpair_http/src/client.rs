//! Blocking HTTP clients built on a shared `ureq` agent.

use std::io::Read;
use std::time::Duration;

use serde::Serialize;

use crate::error::HttpError;
use crate::wire::{SegmentRequest, SegmentResponse, SubmitRequest};

const USER_AGENT: &str = concat!("maskpair/", env!("CARGO_PKG_VERSION"));

/// Largest body accepted when fetching an image.
const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

/// Shared agent with a request timeout.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }

    /// GET a URL and return the body bytes.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        log::debug!("GET {}", url);
        let response = self.agent.get(url).call()?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_IMAGE_BYTES)
            .read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// POST a JSON body, returning the status and body text.
    ///
    /// Only transport failures are errors here; status handling is up to the
    /// caller.
    pub fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<(u16, String), HttpError> {
        log::debug!("POST {}", url);
        match self.agent.post(url).send_json(body) {
            Ok(response) => {
                let status = response.status();
                Ok((status, response.into_string()?))
            }
            Err(ureq::Error::Status(code, response)) => {
                Ok((code, response.into_string().unwrap_or_default()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Client for the point-prompt segmentation service.
#[derive(Clone)]
pub struct SegmentationClient {
    http: HttpClient,
    url: String,
}

impl SegmentationClient {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request. Non-200 responses and bodies without a mask are
    /// errors.
    pub fn segment(&self, request: &SegmentRequest) -> Result<SegmentResponse, HttpError> {
        let (status, body) = self.http.post_json(&self.url, request)?;
        if status != 200 {
            return Err(HttpError::Status { code: status, body });
        }

        let response: SegmentResponse =
            serde_json::from_str(&body).map_err(|e| HttpError::Decode(e.to_string()))?;
        if response.first_mask().is_none() {
            return Err(HttpError::Decode("response contains no mask".to_string()));
        }
        Ok(response)
    }
}

/// Client for the backend that receives finished annotations.
#[derive(Clone)]
pub struct SubmissionClient {
    http: HttpClient,
    url: String,
}

impl SubmissionClient {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the submission. Exactly HTTP 200 counts as success.
    pub fn submit(&self, request: &SubmitRequest) -> Result<(), HttpError> {
        let (status, body) = self.http.post_json(&self.url, request)?;
        if status == 200 {
            log::info!("Submission accepted by {}", self.url);
            Ok(())
        } else {
            log::warn!("Submission rejected with HTTP {}", status);
            Err(HttpError::Status { code: status, body })
        }
    }
}
