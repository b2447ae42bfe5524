//! Per-image annotation state.
//!
//! Each of the two image slots owns an [`AnnotationSession`]. User actions are
//! dispatched as [`Command`]s through the [`SessionStore`], which applies them
//! to one slot and returns an immutable [`SessionSnapshot`] for rendering.

mod command;
mod snapshot;
mod state;
mod store;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use command::Command;
pub use snapshot::SessionSnapshot;
pub use state::{AnnotationMode, AnnotationSession, Phase};
pub use store::{SessionSettings, SessionStore};

/// One of the two image slots in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Base,
    Reference,
}

impl Slot {
    pub fn all() -> [Slot; 2] {
        [Slot::Base, Slot::Reference]
    }

    /// The other slot.
    pub fn other(&self) -> Slot {
        match self {
            Slot::Base => Slot::Reference,
            Slot::Reference => Slot::Base,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Slot::Base => "base",
            Slot::Reference => "reference",
        }
    }

    /// Short prefix used in canvas keys.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Slot::Base => "base",
            Slot::Reference => "ref",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Slot::Base => 0,
            Slot::Reference => 1,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
