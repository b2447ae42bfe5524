//! Mask overlays for display and mask cloning between images.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point as PixelPoint;
use serde::{Deserialize, Serialize};

use crate::codec::{Mask, mask_to_rgba};
use crate::constants::{CONTOUR_EPSILON, DEFAULT_OVERLAY_COLOR, DEFAULT_OVERLAY_OPACITY};
use crate::error::MaskError;
use crate::geometry::{Size, scale_mask};

/// How a mask is tinted when drawn over its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Tint colour
    pub color: [u8; 3],
    /// Fill alpha, 0 (invisible) to 255 (opaque)
    pub opacity: u8,
    /// Outline the mask's outer contours at full opacity
    pub draw_border: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_OVERLAY_COLOR,
            opacity: DEFAULT_OVERLAY_OPACITY,
            draw_border: false,
        }
    }
}

/// Draw `mask` over `image` as a tinted layer.
///
/// The mask is resampled (nearest-neighbor) to the image size first when the
/// sizes differ. Borders are drawn at full alpha on top of the fill so they
/// stay visible however faint the fill is. The output always has the image's
/// dimensions and neither input is modified.
pub fn overlay(
    image: &RgbImage,
    mask: &Mask,
    style: &OverlayStyle,
) -> Result<RgbaImage, MaskError> {
    let size = Size::of(image)?;
    let mask = scale_mask(mask, size)?;

    let [r, g, b] = style.color;
    let mut layer = mask_to_rgba(
        &mask,
        i32::from(r),
        i32::from(g),
        i32::from(b),
        i32::from(style.opacity),
    );

    if style.draw_border {
        draw_outer_contours(&mut layer, &mask, Rgb(style.color));
    }

    let base = image::DynamicImage::ImageRgb8(image.clone()).to_rgba8();
    Ok(alpha_composite(&base, &layer))
}

/// Simplified outer contours of a mask, as closed polygons.
pub fn outer_contours(mask: &Mask) -> Vec<Vec<PixelPoint<i32>>> {
    find_contours::<i32>(mask.as_image())
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| approximate_polygon_dp(&c.points, CONTOUR_EPSILON, true))
        .filter(|poly| !poly.is_empty())
        .collect()
}

fn draw_outer_contours(layer: &mut RgbaImage, mask: &Mask, color: Rgb<u8>) {
    let edge = Rgba([color[0], color[1], color[2], 255]);

    for poly in outer_contours(mask) {
        if poly.len() == 1 {
            let p = poly[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < layer.width() && (p.y as u32) < layer.height()
            {
                layer.put_pixel(p.x as u32, p.y as u32, edge);
            }
            continue;
        }
        for (i, start) in poly.iter().enumerate() {
            let end = poly[(i + 1) % poly.len()];
            draw_line_segment_mut(
                layer,
                (start.x as f32, start.y as f32),
                (end.x as f32, end.y as f32),
                edge,
            );
        }
    }
}

/// Composite `top` over `base` with the standard "over" operator.
///
/// The result has the base's dimensions; any part of `top` outside the base
/// is ignored.
pub fn alpha_composite(base: &RgbaImage, top: &RgbaImage) -> RgbaImage {
    let mut out = base.clone();
    let w = base.width().min(top.width());
    let h = base.height().min(top.height());

    for y in 0..h {
        for x in 0..w {
            let blended = over(*base.get_pixel(x, y), *top.get_pixel(x, y));
            out.put_pixel(x, y, blended);
        }
    }
    out
}

fn over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (f32::from(src[c]) * sa + f32::from(dst[c]) * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Copy a mask into another image's context by resampling it.
///
/// The result is an independent copy; later edits to either side do not
/// affect the other.
pub fn clone_mask_to_context(source: &Mask, target: Size) -> Result<Mask, MaskError> {
    scale_mask(source, target)
}
