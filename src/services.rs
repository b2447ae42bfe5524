//! Seams to the external collaborators.
//!
//! The engine only sees these traits. The `maskpair_http` clients implement
//! them for real deployments; tests plug in fakes.

use maskpair_http::{HttpClient, HttpError, SegmentationClient, SubmissionClient};

pub use maskpair_http::{SegmentRequest, SegmentResponse, SubmitRequest};

use crate::error::MaskError;

/// Fetches the bytes behind an image URL.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, MaskError>;
}

/// Turns an image plus point prompts into a mask.
pub trait Segmenter {
    /// Run one segmentation request. Any failure leaves caller state intact.
    fn segment(&self, request: &SegmentRequest) -> Result<SegmentResponse, MaskError>;
}

/// Receives the finished pair of masks.
pub trait Submitter {
    fn submit(&self, request: &SubmitRequest) -> Result<(), MaskError>;
}

impl ImageFetcher for HttpClient {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, MaskError> {
        self.get_bytes(url)
            .map_err(|e| MaskError::invalid_source(format!("failed to fetch {}: {}", url, e)))
    }
}

impl Segmenter for SegmentationClient {
    fn segment(&self, request: &SegmentRequest) -> Result<SegmentResponse, MaskError> {
        SegmentationClient::segment(self, request)
            .map_err(|e| MaskError::Segmentation(e.to_string()))
    }
}

impl Submitter for SubmissionClient {
    fn submit(&self, request: &SubmitRequest) -> Result<(), MaskError> {
        SubmissionClient::submit(self, request).map_err(|e| {
            let status = e.status();
            let body = match e {
                HttpError::Status { body, .. } => body,
                other => other.to_string(),
            };
            MaskError::Transport { status, body }
        })
    }
}

/// Segmenter used when no segmentation service is configured.
pub struct NoSegmenter;

impl Segmenter for NoSegmenter {
    fn segment(&self, _request: &SegmentRequest) -> Result<SegmentResponse, MaskError> {
        Err(MaskError::Segmentation(
            "no segmentation service configured".to_string(),
        ))
    }
}
