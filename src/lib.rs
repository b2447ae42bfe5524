//! maskpair - paired mask annotation
//!
//! Engine for annotating a base and a reference image with binary masks,
//! either drawn directly or produced by a point-prompt segmentation service,
//! and submitting both masks to a backend.
//!
//! Masks live at display resolution while editing and are resampled to the
//! original image resolution on submission. Point prompts are mapped into
//! the segmentation model's square input space.

pub mod codec;
pub mod color;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod drawing;
pub mod error;
pub mod geometry;
pub mod services;
pub mod session;
pub mod source;

#[cfg(test)]
mod test_image;

pub use codec::Mask;
pub use compositor::OverlayStyle;
pub use config::AppConfig;
pub use error::{ErrorCategory, MaskError};
pub use geometry::{PointLabel, Size};
pub use services::{ImageFetcher, NoSegmenter, Segmenter, Submitter};
pub use session::{Command, SessionSettings, SessionSnapshot, SessionStore, Slot};
