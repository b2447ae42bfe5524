//! Holder for both slot sessions and the single entry point for actions.

use image::RgbaImage;

use crate::codec::Mask;
use crate::compositor::{OverlayStyle, clone_mask_to_context};
use crate::config::AppConfig;
use crate::constants::{DEFAULT_MAX_IMAGE_EDGE, DEFAULT_MODEL_INPUT_SIZE};
use crate::error::MaskError;
use crate::geometry::{DisplaySpace, Point, PointPrompt};
use crate::services::{ImageFetcher, Segmenter, SubmitRequest, Submitter};
use crate::source::{ImageSource, load_image};

use super::Slot;
use super::command::Command;
use super::snapshot::SessionSnapshot;
use super::state::AnnotationSession;

/// Engine settings shared by both slots.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Side of the square model-input space
    pub model_input_size: u32,
    /// Longest edge of display images
    pub max_image_edge: u32,
    /// Overlay colour and opacity, also sent with segmentation requests
    pub overlay: OverlayStyle,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model_input_size: DEFAULT_MODEL_INPUT_SIZE,
            max_image_edge: DEFAULT_MAX_IMAGE_EDGE,
            overlay: OverlayStyle::default(),
        }
    }
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model_input_size: config.model_input_size,
            max_image_edge: config.max_image_edge,
            overlay: config.overlay,
        }
    }
}

/// Both slot sessions of one annotation task.
///
/// Actions on one slot never change the other, except `CloneMask`, which
/// reads the source slot and writes only the target.
#[derive(Debug, Clone)]
pub struct SessionStore {
    settings: SessionSettings,
    sessions: [Option<AnnotationSession>; 2],
}

impl SessionStore {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            sessions: [None, None],
        }
    }

    /// Load both images. Either failure aborts the whole load.
    pub fn load(
        base: &str,
        reference: &str,
        fetcher: &dyn ImageFetcher,
        settings: SessionSettings,
    ) -> Result<Self, MaskError> {
        let mut store = Self::new(settings);
        store.load_slot(Slot::Base, base, fetcher)?;
        store.load_slot(Slot::Reference, reference, fetcher)?;
        Ok(store)
    }

    /// Load an image into one slot.
    ///
    /// Loading the source a slot already holds keeps its session as is; a
    /// different source starts a new session for the new image. A failed load
    /// leaves the slot untouched.
    pub fn load_slot(
        &mut self,
        slot: Slot,
        source: &str,
        fetcher: &dyn ImageFetcher,
    ) -> Result<(), MaskError> {
        let source = ImageSource::parse(source)?;
        if let Some(existing) = &self.sessions[slot.index()] {
            if existing.image().source() == &source {
                log::debug!("{}: already loaded, keeping session", slot);
                return Ok(());
            }
            log::debug!("{}: replacing loaded image", slot);
        }

        let image = load_image(source, fetcher, self.settings.max_image_edge)?;
        self.sessions[slot.index()] = Some(AnnotationSession::new(slot, image));
        Ok(())
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_loaded(&self, slot: Slot) -> bool {
        self.sessions[slot.index()].is_some()
    }

    pub fn session(&self, slot: Slot) -> Result<&AnnotationSession, MaskError> {
        self.sessions[slot.index()]
            .as_ref()
            .ok_or(MaskError::SlotNotLoaded(slot.name()))
    }

    pub fn session_mut(&mut self, slot: Slot) -> Result<&mut AnnotationSession, MaskError> {
        self.sessions[slot.index()]
            .as_mut()
            .ok_or(MaskError::SlotNotLoaded(slot.name()))
    }

    pub fn snapshot(&self, slot: Slot) -> Result<SessionSnapshot, MaskError> {
        Ok(self.session(slot)?.snapshot())
    }

    /// Apply one action and return the affected slot's new state.
    pub fn dispatch(
        &mut self,
        command: Command,
        segmenter: &dyn Segmenter,
    ) -> Result<SessionSnapshot, MaskError> {
        log::debug!("Dispatch: {}", command.description());
        let slot = command.slot();

        match command {
            Command::SetMode { slot, mode } => self.session_mut(slot)?.set_mode(mode),
            Command::AddPoint { slot, x, y, label } => {
                let point = Point::<DisplaySpace>::new(x, y);
                self.session_mut(slot)?.add_point(PointPrompt::new(point, label))?;
            }
            Command::CreateMask { slot } => {
                let side = self.settings.model_input_size;
                let style = self.settings.overlay;
                self.session_mut(slot)?.create_mask(segmenter, side, &style)?;
            }
            Command::Draw { slot, objects } => self.session_mut(slot)?.append_objects(objects)?,
            Command::ReplaceDrawing { slot, objects } => {
                self.session_mut(slot)?.update_drawing(objects)?
            }
            Command::Reset { slot } => self.session_mut(slot)?.reset(),
            Command::CloneMask { target } => self.clone_mask(target)?,
        }

        self.snapshot(slot)
    }

    /// Derive a slot's mask from a raw RGBA drawing buffer.
    pub fn update_drawing_buffer(
        &mut self,
        slot: Slot,
        buffer: &RgbaImage,
    ) -> Result<SessionSnapshot, MaskError> {
        let session = self.session_mut(slot)?;
        session.update_drawing_buffer(buffer)?;
        Ok(session.snapshot())
    }

    /// Seed `target`'s fresh drawing surface with the other slot's mask.
    ///
    /// The source mask is resampled to the target's canvas and copied. The
    /// source slot is not modified.
    pub fn clone_mask(&mut self, target: Slot) -> Result<(), MaskError> {
        let source_slot = target.other();
        let source = self
            .session(source_slot)?
            .mask()
            .cloned()
            .ok_or_else(|| MaskError::MissingMask {
                slots: vec![source_slot.name()],
            })?;

        let target_session = self.session_mut(target)?;
        let cloned = clone_mask_to_context(&source, target_session.display_size())?;
        target_session.seed_from_mask(&cloned)?;
        log::info!("Cloned {} mask into {}", source_slot, target);
        Ok(())
    }

    /// Both masks at natural resolution, or the slots that lack one.
    fn natural_masks(&self) -> Result<[Mask; 2], MaskError> {
        let mut missing = Vec::new();
        let mut masks = Vec::with_capacity(2);

        for slot in Slot::all() {
            match self.session(slot) {
                Ok(session) => match session.natural_mask()? {
                    Some(mask) => masks.push(mask),
                    None => missing.push(slot.name()),
                },
                Err(_) => missing.push(slot.name()),
            }
        }

        match <[Mask; 2]>::try_from(masks) {
            Ok(masks) if missing.is_empty() => Ok(masks),
            _ => Err(MaskError::MissingMask { slots: missing }),
        }
    }

    /// Build the submission payload.
    ///
    /// Fails with `MissingMask` unless both slots have a mask; nothing is sent
    /// in that case.
    pub fn submission(&self, email: &str) -> Result<SubmitRequest, MaskError> {
        let [base_mask, reference_mask] = self.natural_masks()?;
        let base = self.session(Slot::Base)?;
        let reference = self.session(Slot::Reference)?;

        Ok(SubmitRequest {
            base_image: base.image().source().as_str().to_string(),
            reference_image: reference.image().source().as_str().to_string(),
            base_mask: base_mask.to_base64_png()?,
            reference_mask: reference_mask.to_base64_png()?,
            email: email.to_string(),
        })
    }

    /// Send both masks to the backend.
    pub fn submit(&self, email: &str, submitter: &dyn Submitter) -> Result<(), MaskError> {
        let request = self.submission(email)?;
        log::info!("Submitting masks for {}", email);
        submitter.submit(&request)?;
        log::info!("Submission accepted");
        Ok(())
    }

    /// Overlay of a slot's current mask on its display image.
    pub fn overlay(&self, slot: Slot) -> Result<RgbaImage, MaskError> {
        self.session(slot)?.overlay(&self.settings.overlay)
    }
}
