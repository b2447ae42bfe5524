//! Error types for mask annotation operations.

use thiserror::Error;

/// Broad failure category, used when reporting an error back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or unusable input (image source, drawing buffer, config)
    Input,
    /// The segmentation service failed
    Service,
    /// An action was attempted before its requirements were met
    Precondition,
    /// Submission to the backend failed
    Transport,
    /// Encoding, decoding or geometry failures inside the engine
    Internal,
}

/// Errors that can occur while annotating, compositing or submitting masks.
#[derive(Error, Debug)]
pub enum MaskError {
    /// A size with a zero width or height was used for scaling
    #[error("Zero dimension: {width}x{height}")]
    ZeroDimension {
        /// Offending width
        width: u32,
        /// Offending height
        height: u32,
    },

    /// Two rasters that must agree in size do not
    #[error("Dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        /// Expected (width, height)
        expected: (u32, u32),
        /// Found (width, height)
        found: (u32, u32),
    },

    /// Base64 payload could not be decoded
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Image encoding or decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Image source string is empty, unreachable or not an image
    #[error("Invalid image source: {message}")]
    InvalidImageSource {
        /// Description of the problem
        message: String,
    },

    /// Action not allowed in the slot's current state
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        /// The attempted action
        action: &'static str,
        /// The state that forbids it
        state: String,
    },

    /// A point prompt placed outside the display canvas
    #[error("Point ({x}, {y}) is outside the {width}x{height} canvas")]
    PointOutOfBounds {
        /// Point x in display pixels
        x: f64,
        /// Point y in display pixels
        y: f64,
        /// Canvas width
        width: u32,
        /// Canvas height
        height: u32,
    },

    /// Mask creation requested without any point prompts
    #[error("At least one point is required to create a mask")]
    NoPoints,

    /// One or more masks required for the action are absent
    #[error("Missing mask for: {}", .slots.join(", "))]
    MissingMask {
        /// Names of the slots without a mask
        slots: Vec<&'static str>,
    },

    /// The slot has no image loaded yet
    #[error("No image loaded for slot '{0}'")]
    SlotNotLoaded(&'static str),

    /// Segmentation service failed; the previous mask is kept
    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    /// Submission failed
    #[error("Submission failed{}: {body}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status, when the server answered
        status: Option<u16>,
        /// Response body or transport error text
        body: String,
    },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MaskError {
    /// Create an invalid image source error.
    pub fn invalid_source(message: impl Into<String>) -> Self {
        Self::InvalidImageSource {
            message: message.into(),
        }
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(action: &'static str, state: impl Into<String>) -> Self {
        Self::InvalidTransition {
            action,
            state: state.into(),
        }
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: (u32, u32), found: (u32, u32)) -> Self {
        Self::DimensionMismatch { expected, found }
    }

    /// Which of the reporting categories this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidImageSource { .. }
            | Self::PointOutOfBounds { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorCategory::Input,
            Self::Segmentation(_) => ErrorCategory::Service,
            Self::InvalidTransition { .. }
            | Self::NoPoints
            | Self::MissingMask { .. }
            | Self::SlotNotLoaded(_) => ErrorCategory::Precondition,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::ZeroDimension { .. }
            | Self::DimensionMismatch { .. }
            | Self::Base64(_)
            | Self::Image(_) => ErrorCategory::Internal,
        }
    }
}
