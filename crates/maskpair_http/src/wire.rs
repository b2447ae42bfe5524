//! JSON payloads exchanged with the segmentation service and the backend.

use serde::{Deserialize, Serialize};

/// Point-prompt segmentation request.
///
/// `points` are `[x, y]` in the model's square input space and `labels` runs
/// parallel to them (1 = include, 0 = exclude).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRequest {
    /// Base64 PNG of the image at model-input resolution
    pub image: String,
    pub points: Vec<[u32; 2]>,
    pub labels: Vec<u8>,
    /// Mask tint colour
    pub color: [u8; 3],
    /// Mask tint alpha
    pub alpha: u8,
}

/// Segmentation response: a single mask or a stack of candidates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masks: Vec<String>,
}

impl SegmentResponse {
    /// The mask to use: `mask` when present, else the first of `masks`.
    pub fn first_mask(&self) -> Option<&str> {
        self.mask
            .as_deref()
            .or_else(|| self.masks.first().map(String::as_str))
            .filter(|m| !m.trim().is_empty())
    }
}

/// Final submission of both images and their masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Base image source as originally given (URL or inline data)
    pub base_image: String,
    /// Reference image source as originally given
    pub reference_image: String,
    /// Base64 PNG of the base mask at original resolution
    pub base_mask: String,
    /// Base64 PNG of the reference mask at original resolution
    pub reference_mask: String,
    pub email: String,
}
