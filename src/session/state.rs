//! Annotation state machine for a single image slot.
//!
//! Two independent tracks share one slot:
//! - point mode: `Empty -> PointsCollected -> MaskGenerated`
//! - draw mode: `Empty -> StrokeDrawn -> MaskDerived`
//!
//! Every mask-producing operation computes the complete new mask before
//! touching the session, so a failure leaves the previous state intact.

use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::codec::{Mask, buffer_to_mask, decode_mask, encode_png_base64};
use crate::compositor::{OverlayStyle, overlay};
use crate::drawing::{Canvas, DrawingObject, DrawingTool, InitialDrawing, mask_background_object};
use crate::error::MaskError;
use crate::geometry::{
    DisplaySpace, ModelSpace, Point, PointLabel, PointPrompt, Size, scale_mask, scale_prompt,
};
use crate::services::{SegmentRequest, Segmenter};
use crate::source::SlotImage;

use super::Slot;
use super::snapshot::SessionSnapshot;

/// How the user is annotating a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnnotationMode {
    /// Positive/negative point prompts for the segmentation service
    Point,
    /// Direct drawing with a tool
    Draw {
        #[serde(default)]
        tool: DrawingTool,
    },
}

impl Default for AnnotationMode {
    fn default() -> Self {
        AnnotationMode::Draw {
            tool: DrawingTool::default(),
        }
    }
}

impl AnnotationMode {
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationMode::Point => "point",
            AnnotationMode::Draw { tool } => tool.name(),
        }
    }
}

/// Where a slot is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Empty,
    PointsCollected,
    MaskGenerated,
    StrokeDrawn,
    MaskDerived,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Empty => "empty",
            Phase::PointsCollected => "points collected",
            Phase::MaskGenerated => "mask generated",
            Phase::StrokeDrawn => "stroke drawn",
            Phase::MaskDerived => "mask derived",
        }
    }

    fn accepts_points(&self) -> bool {
        matches!(self, Phase::Empty | Phase::PointsCollected)
    }

    fn accepts_drawing(&self) -> bool {
        matches!(self, Phase::Empty | Phase::StrokeDrawn | Phase::MaskDerived)
    }
}

/// Annotation state of one image slot.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    slot: Slot,
    image: SlotImage,
    mode: AnnotationMode,
    positive: Vec<Point<DisplaySpace>>,
    negative: Vec<Point<DisplaySpace>>,
    objects: Vec<DrawingObject>,
    initial_drawing: Option<InitialDrawing>,
    mask: Option<Arc<Mask>>,
    phase: Phase,
    reset_counter: u64,
}

impl AnnotationSession {
    pub fn new(slot: Slot, image: SlotImage) -> Self {
        Self {
            slot,
            image,
            mode: AnnotationMode::default(),
            positive: Vec::new(),
            negative: Vec::new(),
            objects: Vec::new(),
            initial_drawing: None,
            mask: None,
            phase: Phase::Empty,
            reset_counter: 0,
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn image(&self) -> &SlotImage {
        &self.image
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reset_counter(&self) -> u64 {
        self.reset_counter
    }

    pub fn objects(&self) -> &[DrawingObject] {
        &self.objects
    }

    /// Seed the current surface was created with, if any.
    pub fn initial_drawing(&self) -> Option<&InitialDrawing> {
        self.initial_drawing.as_ref()
    }

    /// Current mask at display resolution.
    pub fn mask(&self) -> Option<&Arc<Mask>> {
        self.mask.as_ref()
    }

    pub fn display_size(&self) -> Size {
        self.image.display_size()
    }

    /// Key identifying the current drawing surface; changes on every reset.
    pub fn canvas_key(&self) -> String {
        if self.reset_counter == 0 {
            format!("initial_{}_canvas", self.slot.key_prefix())
        } else {
            format!("{}_canvas_{}", self.slot.key_prefix(), self.reset_counter)
        }
    }

    pub fn set_mode(&mut self, mode: AnnotationMode) {
        if self.mode != mode {
            log::debug!("{}: mode {} -> {}", self.slot, self.mode.name(), mode.name());
            self.mode = mode;
        }
    }

    fn transition(&mut self, phase: Phase) {
        if self.phase != phase {
            log::debug!("{}: {} -> {}", self.slot, self.phase.name(), phase.name());
            self.phase = phase;
        }
    }

    fn install_mask(&mut self, mask: Mask, phase: Phase) {
        self.mask = Some(Arc::new(mask));
        self.transition(phase);
    }

    // ------------------------------------------------------------------------
    // Point mode
    // ------------------------------------------------------------------------

    /// Add a point prompt. Does not produce a mask.
    pub fn add_point(&mut self, prompt: PointPrompt<DisplaySpace>) -> Result<(), MaskError> {
        if self.mode != AnnotationMode::Point {
            return Err(MaskError::invalid_transition(
                "add a point",
                format!("in {} mode", self.mode.name()),
            ));
        }
        if !self.phase.accepts_points() {
            return Err(MaskError::invalid_transition("add a point", self.phase.name()));
        }
        let display = self.display_size();
        if !prompt.point.is_within(display) {
            return Err(MaskError::PointOutOfBounds {
                x: prompt.point.x,
                y: prompt.point.y,
                width: display.width(),
                height: display.height(),
            });
        }

        match prompt.label {
            PointLabel::Positive => self.positive.push(prompt.point),
            PointLabel::Negative => self.negative.push(prompt.point),
        }
        self.transition(Phase::PointsCollected);
        Ok(())
    }

    pub fn positive_points(&self) -> &[Point<DisplaySpace>] {
        &self.positive
    }

    pub fn negative_points(&self) -> &[Point<DisplaySpace>] {
        &self.negative
    }

    /// All prompts, positive first, in display space.
    pub fn prompts(&self) -> Vec<PointPrompt<DisplaySpace>> {
        let positive = self
            .positive
            .iter()
            .map(|p| PointPrompt::new(*p, PointLabel::Positive));
        let negative = self
            .negative
            .iter()
            .map(|p| PointPrompt::new(*p, PointLabel::Negative));
        positive.chain(negative).collect()
    }

    /// All prompts converted to the model's square input space.
    pub fn model_prompts(
        &self,
        model_side: u32,
    ) -> Result<Vec<PointPrompt<ModelSpace>>, MaskError> {
        let model = Size::square(model_side)?;
        let display = self.display_size();
        Ok(self
            .prompts()
            .into_iter()
            .map(|p| scale_prompt(p, display, model))
            .collect())
    }

    /// Build the segmentation request for the collected points.
    pub fn segment_request(
        &self,
        model_side: u32,
        style: &OverlayStyle,
    ) -> Result<SegmentRequest, MaskError> {
        let prompts = self.model_prompts(model_side)?;
        if prompts.is_empty() {
            return Err(MaskError::NoPoints);
        }

        let model_image = self.image.model_input(model_side)?;
        Ok(SegmentRequest {
            image: encode_png_base64(&image::DynamicImage::ImageRgb8(model_image))?,
            points: prompts.iter().map(|p| p.point.to_pixel()).collect(),
            labels: prompts.iter().map(|p| p.label.as_wire()).collect(),
            color: style.color,
            alpha: style.opacity,
        })
    }

    /// Ask the segmentation service for a mask from the collected points.
    ///
    /// Requires point mode and at least one point. On any service failure the
    /// session is left exactly as it was.
    pub fn create_mask(
        &mut self,
        segmenter: &dyn Segmenter,
        model_side: u32,
        style: &OverlayStyle,
    ) -> Result<(), MaskError> {
        if self.mode != AnnotationMode::Point {
            return Err(MaskError::invalid_transition(
                "create a mask from points",
                format!("in {} mode", self.mode.name()),
            ));
        }
        if !matches!(self.phase, Phase::PointsCollected | Phase::MaskGenerated) {
            return Err(MaskError::NoPoints);
        }

        let request = self.segment_request(model_side, style)?;
        log::info!(
            "{}: requesting segmentation with {} points",
            self.slot,
            request.points.len()
        );

        let response = segmenter.segment(&request).inspect_err(|e| {
            log::warn!("{}: segmentation failed: {}", self.slot, e);
        })?;
        let encoded = response
            .first_mask()
            .ok_or_else(|| MaskError::Segmentation("response contains no mask".to_string()))?;
        let model_mask = decode_mask(encoded)
            .map_err(|e| MaskError::Segmentation(format!("malformed mask: {}", e)))?;
        let mask = scale_mask(&model_mask, self.display_size())?;

        self.install_mask(mask, Phase::MaskGenerated);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Draw mode
    // ------------------------------------------------------------------------

    fn check_drawing(&self, action: &'static str) -> Result<(), MaskError> {
        if !matches!(self.mode, AnnotationMode::Draw { .. }) {
            return Err(MaskError::invalid_transition(
                action,
                format!("in {} mode", self.mode.name()),
            ));
        }
        if !self.phase.accepts_drawing() {
            return Err(MaskError::invalid_transition(action, self.phase.name()));
        }
        Ok(())
    }

    /// Replace the drawing surface with `objects` and derive a new mask.
    ///
    /// The list is the whole surface, not a diff. Redrawing the same objects
    /// yields the same mask.
    pub fn update_drawing(&mut self, objects: Vec<DrawingObject>) -> Result<(), MaskError> {
        self.check_drawing("draw")?;

        let buffer = Canvas::rasterize(&objects, self.display_size())?;
        self.transition(Phase::StrokeDrawn);
        let mask = buffer_to_mask(&buffer);

        self.objects = objects;
        self.install_mask(mask, Phase::MaskDerived);
        Ok(())
    }

    /// Append objects to the surface; see [`Self::update_drawing`].
    ///
    /// The transform tool only rearranges existing objects, so appending is
    /// refused while it is selected.
    pub fn append_objects(&mut self, objects: Vec<DrawingObject>) -> Result<(), MaskError> {
        if matches!(self.mode, AnnotationMode::Draw { tool: DrawingTool::Transform }) {
            return Err(MaskError::invalid_transition("add objects", "in transform mode"));
        }
        let mut all = self.objects.clone();
        all.extend(objects);
        self.update_drawing(all)
    }

    /// Derive the mask from a raw RGBA drawing buffer supplied by a front end.
    pub fn update_drawing_buffer(&mut self, buffer: &RgbaImage) -> Result<(), MaskError> {
        self.check_drawing("draw")?;

        let expected = self.display_size().as_tuple();
        if buffer.dimensions() != expected {
            return Err(MaskError::dimension_mismatch(expected, buffer.dimensions()));
        }
        self.transition(Phase::StrokeDrawn);
        self.install_mask(buffer_to_mask(buffer), Phase::MaskDerived);
        Ok(())
    }

    /// True when nothing has been drawn or prompted since the last reset.
    pub fn is_fresh(&self) -> bool {
        self.phase == Phase::Empty && self.objects.is_empty() && self.initial_drawing.is_none()
    }

    /// Seed a fresh surface with `mask` as a background object.
    ///
    /// The mask is copied and resampled to this slot's canvas; it is not
    /// linked to its source.
    pub fn seed_from_mask(&mut self, mask: &Mask) -> Result<(), MaskError> {
        if !self.is_fresh() {
            return Err(MaskError::invalid_transition(
                "seed the drawing surface",
                format!("{} (surface in progress)", self.phase.name()),
            ));
        }

        let size = self.display_size();
        let background = mask_background_object(mask, size)?;
        let buffer = Canvas::rasterize(std::slice::from_ref(&background), size)?;
        let derived = buffer_to_mask(&buffer);

        self.initial_drawing = Some(InitialDrawing::new(vec![background.clone()]));
        self.objects = vec![background];
        self.install_mask(derived, Phase::MaskDerived);
        log::info!("{}: surface seeded with a {} mask", self.slot, size);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reset and output
    // ------------------------------------------------------------------------

    /// Return to `Empty`, discarding points, drawing and mask.
    ///
    /// The loaded image and mode are kept; the reset counter moves on so a
    /// front end creates a new drawing surface.
    pub fn reset(&mut self) {
        self.positive.clear();
        self.negative.clear();
        self.objects.clear();
        self.initial_drawing = None;
        self.mask = None;
        self.reset_counter += 1;
        self.transition(Phase::Empty);
        log::info!("{}: reset (surface {})", self.slot, self.canvas_key());
    }

    /// Current mask resampled to the original image resolution.
    pub fn natural_mask(&self) -> Result<Option<Mask>, MaskError> {
        self.mask
            .as_ref()
            .map(|m| scale_mask(m, self.image.natural_size()))
            .transpose()
    }

    /// Display image with the current mask tinted over it.
    pub fn overlay(&self, style: &OverlayStyle) -> Result<RgbaImage, MaskError> {
        let empty;
        let mask = match &self.mask {
            Some(mask) => mask.as_ref(),
            None => {
                empty = Mask::empty(self.display_size());
                &empty
            }
        };
        overlay(self.image.display(), mask, style)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            slot: self.slot,
            phase: self.phase,
            mode: self.mode,
            reset_counter: self.reset_counter,
            canvas_key: self.canvas_key(),
            positive_points: self.positive.len(),
            negative_points: self.negative.len(),
            object_count: self.objects.len(),
            seeded: self.initial_drawing.is_some(),
            display_size: self.display_size(),
            mask: self.mask.clone(),
        }
    }
}
