//! Blocking HTTP transport for maskpair.
//!
//! Fetches remote images, calls the point-prompt segmentation service and
//! posts finished annotations to the backend. Each call is a single request
//! with a timeout; there are no retries.

mod client;
mod error;
mod wire;

pub use client::{HttpClient, SegmentationClient, SubmissionClient};
pub use error::HttpError;
pub use wire::{SegmentRequest, SegmentResponse, SubmitRequest};
