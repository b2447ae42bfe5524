//! Immutable view of a slot after an action.

use std::sync::Arc;

use crate::codec::Mask;
use crate::geometry::Size;

use super::Slot;
use super::state::{AnnotationMode, Phase};

/// Snapshot of one slot's annotation state.
///
/// The mask is shared, not copied; it is never mutated in place, so a
/// snapshot stays valid after the session moves on.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Slot this snapshot describes
    pub slot: Slot,
    /// Current state machine phase
    pub phase: Phase,
    /// Current annotation mode
    pub mode: AnnotationMode,
    /// Number of resets so far
    pub reset_counter: u64,
    /// Identity of the current drawing surface
    pub canvas_key: String,
    /// Positive point prompts collected
    pub positive_points: usize,
    /// Negative point prompts collected
    pub negative_points: usize,
    /// Drawing objects on the surface
    pub object_count: usize,
    /// Whether the surface was seeded from another slot's mask
    pub seeded: bool,
    /// Canvas (display) size
    pub display_size: Size,
    /// Current mask at display resolution
    pub mask: Option<Arc<Mask>>,
}

impl SessionSnapshot {
    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// Foreground fraction of the current mask, zero without one.
    pub fn coverage(&self) -> f64 {
        self.mask.as_ref().map(|m| m.coverage()).unwrap_or(0.0)
    }
}
