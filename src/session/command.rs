//! User actions dispatched to a session store.

use serde::{Deserialize, Serialize};

use crate::drawing::DrawingObject;
use crate::geometry::PointLabel;

use super::Slot;
use super::state::AnnotationMode;

/// A single user action against one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Switch between point prompting and drawing
    SetMode {
        slot: Slot,
        mode: AnnotationMode,
    },
    /// Add a point prompt in display coordinates
    AddPoint {
        slot: Slot,
        x: f64,
        y: f64,
        label: PointLabel,
    },
    /// Ask the segmentation service for a mask from the collected points
    CreateMask {
        slot: Slot,
    },
    /// Append objects to the drawing surface
    Draw {
        slot: Slot,
        objects: Vec<DrawingObject>,
    },
    /// Replace the whole drawing surface
    ReplaceDrawing {
        slot: Slot,
        objects: Vec<DrawingObject>,
    },
    /// Discard points, drawing and mask
    Reset {
        slot: Slot,
    },
    /// Seed `target`'s fresh surface with the other slot's mask
    CloneMask {
        target: Slot,
    },
}

impl Command {
    /// Slot the command changes.
    pub fn slot(&self) -> Slot {
        match self {
            Command::SetMode { slot, .. }
            | Command::AddPoint { slot, .. }
            | Command::CreateMask { slot }
            | Command::Draw { slot, .. }
            | Command::ReplaceDrawing { slot, .. }
            | Command::Reset { slot } => *slot,
            Command::CloneMask { target } => *target,
        }
    }

    /// Get a human-readable description of this command
    pub fn description(&self) -> String {
        match self {
            Command::SetMode { slot, mode } => format!("Set {} mode to {}", slot, mode.name()),
            Command::AddPoint { slot, label, .. } => {
                format!("Add {:?} point to {}", label, slot).to_lowercase()
            }
            Command::CreateMask { slot } => format!("Create {} mask", slot),
            Command::Draw { slot, objects } => {
                format!("Draw {} objects on {}", objects.len(), slot)
            }
            Command::ReplaceDrawing { slot, objects } => {
                format!("Replace {} drawing with {} objects", slot, objects.len())
            }
            Command::Reset { slot } => format!("Reset {} canvas", slot),
            Command::CloneMask { target } => {
                format!("Clone {} mask into {}", target.other(), target)
            }
        }
    }
}
