//! Coordinate spaces and the conversions between them.
//!
//! Three spaces are in play:
//! - display space: the downscaled canvas the user draws on
//! - natural space: the original image resolution
//! - model space: the fixed square input of the segmentation model
//!
//! Points carry their space as a type parameter, so a display point can only
//! become a model point through [`scale_point`]. Masks are rasters and are
//! moved between sizes with [`scale_mask`], which is always nearest-neighbor.

use std::fmt;
use std::marker::PhantomData;

use image::{GenericImageView, GrayImage};
use serde::{Deserialize, Serialize};

use crate::codec::Mask;
use crate::error::MaskError;

// ============================================================================
// Sizes
// ============================================================================

/// A raster size with both dimensions non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u32, u32)", into = "(u32, u32)")]
pub struct Size {
    width: u32,
    height: u32,
}

impl Size {
    /// Create a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, MaskError> {
        if width == 0 || height == 0 {
            return Err(MaskError::ZeroDimension { width, height });
        }
        Ok(Self { width, height })
    }

    /// A square size, as used by the model-input space.
    pub fn square(side: u32) -> Result<Self, MaskError> {
        Self::new(side, side)
    }

    /// Size of an image or buffer.
    pub fn of<I: GenericImageView>(image: &I) -> Result<Self, MaskError> {
        let (width, height) = image.dimensions();
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Length of the longer edge.
    pub fn longest_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl TryFrom<(u32, u32)> for Size {
    type Error = MaskError;

    fn try_from((width, height): (u32, u32)) -> Result<Self, Self::Error> {
        Self::new(width, height)
    }
}

impl From<Size> for (u32, u32) {
    fn from(size: Size) -> Self {
        size.as_tuple()
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ============================================================================
// Coordinate spaces
// ============================================================================

/// Marker trait for a coordinate space.
pub trait CoordSpace: Copy + Clone + fmt::Debug + PartialEq + Default {
    /// Name used in logs and debug output.
    const NAME: &'static str;
}

/// Canvas space, in display-resolution pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplaySpace;

/// Original image space, in natural-resolution pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NaturalSpace;

/// Segmentation model input space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelSpace;

impl CoordSpace for DisplaySpace {
    const NAME: &'static str = "display";
}

impl CoordSpace for NaturalSpace {
    const NAME: &'static str = "natural";
}

impl CoordSpace for ModelSpace {
    const NAME: &'static str = "model";
}

/// A 2D point tagged with the space it lives in.
#[derive(Clone, Copy, PartialEq)]
pub struct Point<S: CoordSpace> {
    pub x: f64,
    pub y: f64,
    space: PhantomData<S>,
}

impl<S: CoordSpace> Point<S> {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    /// True when the point lies on a canvas of `size`: `0 <= x < width` and
    /// `0 <= y < height`.
    pub fn is_within(&self, size: Size) -> bool {
        (0.0..f64::from(size.width)).contains(&self.x)
            && (0.0..f64::from(size.height)).contains(&self.y)
    }

    /// Integer pixel coordinates, truncated and saturated at zero.
    pub fn to_pixel(&self) -> [u32; 2] {
        [self.x as u32, self.y as u32]
    }
}

impl<S: CoordSpace> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point<{}>({}, {})", S::NAME, self.x, self.y)
    }
}

/// Label attached to a point prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointLabel {
    /// Include the region under the point
    Positive,
    /// Exclude the region under the point
    Negative,
}

impl PointLabel {
    /// Wire value expected by the segmentation service.
    pub fn as_wire(&self) -> u8 {
        match self {
            PointLabel::Positive => 1,
            PointLabel::Negative => 0,
        }
    }
}

/// A point plus its include/exclude label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPrompt<S: CoordSpace> {
    pub point: Point<S>,
    pub label: PointLabel,
}

impl<S: CoordSpace> PointPrompt<S> {
    pub fn new(point: Point<S>, label: PointLabel) -> Self {
        Self { point, label }
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Scale a point from one space to another.
///
/// Each axis is scaled independently as `x * to_w / from_w` and truncated
/// toward zero. The truncation is part of the contract: the same inputs must
/// always produce the same integer coordinates.
pub fn scale_point<F: CoordSpace, T: CoordSpace>(
    point: Point<F>,
    from: Size,
    to: Size,
) -> Point<T> {
    let x = point.x * f64::from(to.width) / f64::from(from.width);
    let y = point.y * f64::from(to.height) / f64::from(from.height);
    Point::new(x.trunc(), y.trunc())
}

/// Scale a prompt, keeping its label.
pub fn scale_prompt<F: CoordSpace, T: CoordSpace>(
    prompt: PointPrompt<F>,
    from: Size,
    to: Size,
) -> PointPrompt<T> {
    PointPrompt::new(scale_point(prompt.point, from, to), prompt.label)
}

/// Resample a mask to a new size with nearest-neighbor interpolation.
///
/// Destination pixel `(x, y)` takes source pixel
/// `(floor(x * src_w / dst_w), floor(y * src_h / dst_h))`, so the output stays
/// binary. Resampling to the mask's own size returns an identical copy.
pub fn scale_mask(mask: &Mask, to: Size) -> Result<Mask, MaskError> {
    let from = Size::of(mask.as_image())?;
    if from == to {
        return Ok(mask.clone());
    }

    let src = mask.as_image();
    let (sw, sh) = (u64::from(from.width), u64::from(from.height));
    let (dw, dh) = (u64::from(to.width), u64::from(to.height));

    let resized = GrayImage::from_fn(to.width, to.height, |x, y| {
        let sx = (u64::from(x) * sw / dw) as u32;
        let sy = (u64::from(y) * sh / dh) as u32;
        *src.get_pixel(sx, sy)
    });

    log::trace!("Scaled mask {} -> {}", from, to);
    Ok(Mask::from_binary_unchecked(resized))
}
