//! Mask representation and conversions.
//!
//! A [`Mask`] is a single-channel raster whose pixels are either
//! [`MASK_BACKGROUND`] or [`MASK_FOREGROUND`]. This module converts between:
//! - the alpha channel of a drawing buffer and a mask (`> 0` is foreground)
//! - a mask and a tinted RGBA visualization
//! - any image and a base64 PNG string, with or without a data-URL prefix

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};

use crate::constants::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::error::MaskError;
use crate::geometry::Size;

/// Prefix of a PNG data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Binary single-channel mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(GrayImage);

impl Mask {
    /// An all-background mask.
    pub fn empty(size: Size) -> Self {
        Self(GrayImage::new(size.width(), size.height()))
    }

    /// An all-foreground mask.
    pub fn full(size: Size) -> Self {
        Self(GrayImage::from_pixel(
            size.width(),
            size.height(),
            Luma([MASK_FOREGROUND]),
        ))
    }

    /// Binarize a grayscale image: any non-zero pixel is foreground.
    pub fn from_gray(image: &GrayImage) -> Self {
        Self(binarize(image))
    }

    /// Wrap an image already known to be binary.
    pub(crate) fn from_binary_unchecked(image: GrayImage) -> Self {
        debug_assert!(
            image
                .pixels()
                .all(|p| p[0] == MASK_BACKGROUND || p[0] == MASK_FOREGROUND)
        );
        Self(image)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Size of the mask; fails for a zero-sized mask.
    pub fn size(&self) -> Result<Size, MaskError> {
        Size::of(&self.0)
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] == MASK_FOREGROUND
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> u64 {
        self.0.pixels().filter(|p| p[0] == MASK_FOREGROUND).count() as u64
    }

    /// Fraction of pixels that are foreground, in `0.0..=1.0`.
    pub fn coverage(&self) -> f64 {
        let (w, h) = self.0.dimensions();
        let total = u64::from(w) * u64::from(h);
        if total == 0 {
            return 0.0;
        }
        self.foreground_count() as f64 / total as f64
    }

    /// True when no pixel is foreground.
    pub fn is_blank(&self) -> bool {
        self.0.pixels().all(|p| p[0] == MASK_BACKGROUND)
    }

    /// Encode as a base64 PNG (no data-URL prefix).
    pub fn to_base64_png(&self) -> Result<String, MaskError> {
        encode_png_base64(&DynamicImage::ImageLuma8(self.0.clone()))
    }
}

fn binarize(image: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p[0] = if p[0] > 0 {
            MASK_FOREGROUND
        } else {
            MASK_BACKGROUND
        };
    }
    out
}

// ============================================================================
// Drawing buffer <-> mask
// ============================================================================

/// Derive a mask from the alpha channel of drawn strokes.
///
/// Any alpha above zero counts, so anti-aliased stroke edges become full
/// foreground.
pub fn strokes_to_mask(alpha: &GrayImage) -> Mask {
    Mask(binarize(alpha))
}

/// Extract the alpha channel of an RGBA drawing buffer.
pub fn alpha_channel(buffer: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        Luma([buffer.get_pixel(x, y)[3]])
    })
}

/// Derive a mask straight from an RGBA drawing buffer.
pub fn buffer_to_mask(buffer: &RgbaImage) -> Mask {
    strokes_to_mask(&alpha_channel(buffer))
}

/// Render a mask back into a drawing buffer where foreground is opaque black.
pub fn mask_to_alpha_buffer(mask: &Mask) -> RgbaImage {
    mask_to_rgba(mask, 0, 0, 0, 255)
}

/// Clamp a channel value into `0..=255`.
pub fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Build a tinted RGBA visualization of a mask.
///
/// Foreground pixels get `(r, g, b, a)`; background pixels are `(0, 0, 0, 0)`.
/// Out-of-range channel values are clamped rather than rejected.
pub fn mask_to_rgba(mask: &Mask, r: i32, g: i32, b: i32, a: i32) -> RgbaImage {
    let tint = Rgba([
        clamp_channel(r),
        clamp_channel(g),
        clamp_channel(b),
        clamp_channel(a),
    ]);
    let transparent = Rgba([0, 0, 0, 0]);
    let src = mask.as_image();

    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        if src.get_pixel(x, y)[0] == MASK_FOREGROUND {
            tint
        } else {
            transparent
        }
    })
}

// ============================================================================
// Base64 PNG transport
// ============================================================================

/// Encode an image as a base64 PNG string.
pub fn encode_png_base64(image: &DynamicImage) -> Result<String, MaskError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(STANDARD.encode(bytes))
}

/// Wrap a base64 PNG payload in a data URL.
pub fn to_data_url(base64_png: &str) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, base64_png)
}

/// Remove a `data:...;base64,` prefix if present.
pub fn strip_data_url(input: &str) -> &str {
    let trimmed = input.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(',') {
            return payload;
        }
    }
    trimmed
}

/// Decode raw base64 bytes, accepting bare base64 or a data URL.
pub fn decode_base64_bytes(input: &str) -> Result<Vec<u8>, MaskError> {
    Ok(STANDARD.decode(strip_data_url(input))?)
}

/// Decode a base64 PNG (or any format `image` can sniff) into an image.
pub fn decode_base64_png(input: &str) -> Result<DynamicImage, MaskError> {
    let bytes = decode_base64_bytes(input)?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Decode a base64 image and binarize it into a mask.
///
/// Images with an alpha channel use alpha as coverage; all others use luma.
pub fn decode_mask(input: &str) -> Result<Mask, MaskError> {
    let image = decode_base64_png(input)?;
    Ok(mask_from_image(&image))
}

/// Binarize any decoded image into a mask.
pub fn mask_from_image(image: &DynamicImage) -> Mask {
    if image.color().has_alpha() {
        buffer_to_mask(&image.to_rgba8())
    } else {
        Mask::from_gray(&image.to_luma8())
    }
}
