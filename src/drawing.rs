//! Drawing-surface objects and their rasterization.
//!
//! A drawing surface is an ordered, append-only list of [`DrawingObject`]s in
//! display coordinates. Rasterizing the list yields the RGBA drawing buffer a
//! mask is derived from. The serialized form follows the versioned
//! object-list layout of the browser canvas (`{"version", "objects"}`), so a
//! seeded surface can be handed to a front end unchanged.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::codec::{Mask, decode_base64_png, to_data_url};
use crate::color::parse_css_color;
use crate::constants::{
    DEFAULT_FILL_COLOR, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH, DRAWING_FORMAT_VERSION,
    STROKE_WIDTH_RANGE,
};
use crate::error::MaskError;
use crate::geometry::{Size, scale_mask};

// ============================================================================
// Tools and styles
// ============================================================================

/// Drawing tool selected for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingTool {
    #[default]
    Freedraw,
    Line,
    Rect,
    Circle,
    /// Moves existing objects; never adds any
    Transform,
    Polygon,
}

impl DrawingTool {
    pub fn name(&self) -> &'static str {
        match self {
            DrawingTool::Freedraw => "freedraw",
            DrawingTool::Line => "line",
            DrawingTool::Rect => "rect",
            DrawingTool::Circle => "circle",
            DrawingTool::Transform => "transform",
            DrawingTool::Polygon => "polygon",
        }
    }
}

/// Stroke and fill settings applied to new objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    pub stroke_width: f32,
    pub stroke: String,
    pub fill: String,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            stroke_width: DEFAULT_STROKE_WIDTH,
            stroke: DEFAULT_STROKE_COLOR.to_string(),
            fill: DEFAULT_FILL_COLOR.to_string(),
        }
    }
}

impl StrokeStyle {
    /// Stroke width clamped to the supported range.
    pub fn clamped_width(&self) -> f32 {
        self.stroke_width
            .clamp(STROKE_WIDTH_RANGE.0, STROKE_WIDTH_RANGE.1)
    }
}

// ============================================================================
// Objects
// ============================================================================

fn default_stroke() -> String {
    DEFAULT_STROKE_COLOR.to_string()
}

fn default_fill() -> String {
    DEFAULT_FILL_COLOR.to_string()
}

fn default_stroke_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}

fn default_version() -> String {
    DRAWING_FORMAT_VERSION.to_string()
}

fn default_scale() -> f32 {
    1.0
}

/// One drawable object on a surface, in display coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum DrawingObject {
    /// Freehand stroke through a sequence of points
    Path {
        points: Vec<[f32; 2]>,
        #[serde(default = "default_stroke")]
        stroke: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        #[serde(default = "default_stroke")]
        stroke: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },
    Rect {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        #[serde(default = "default_fill")]
        fill: String,
        #[serde(default = "default_stroke")]
        stroke: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },
    /// Circle whose bounding box starts at `(left, top)`
    Circle {
        left: f32,
        top: f32,
        radius: f32,
        #[serde(default = "default_fill")]
        fill: String,
        #[serde(default = "default_stroke")]
        stroke: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },
    Polygon {
        points: Vec<[f32; 2]>,
        #[serde(default = "default_fill")]
        fill: String,
        #[serde(default = "default_stroke")]
        stroke: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },
    /// Raster image; replaces the region it covers
    Image {
        #[serde(default = "default_version")]
        version: String,
        left: f32,
        top: f32,
        width: u32,
        height: u32,
        #[serde(default = "default_scale")]
        scale_x: f32,
        #[serde(default = "default_scale")]
        scale_y: f32,
        src: String,
    },
}

impl DrawingObject {
    /// Freehand stroke with the given style.
    pub fn freehand(points: Vec<[f32; 2]>, style: &StrokeStyle) -> Self {
        DrawingObject::Path {
            points,
            stroke: style.stroke.clone(),
            stroke_width: style.clamped_width(),
        }
    }

    /// Filled rectangle with the given style.
    pub fn rect(left: f32, top: f32, width: f32, height: f32, style: &StrokeStyle) -> Self {
        DrawingObject::Rect {
            left,
            top,
            width,
            height,
            fill: style.fill.clone(),
            stroke: style.stroke.clone(),
            stroke_width: style.clamped_width(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DrawingObject::Path { .. } => "path",
            DrawingObject::Line { .. } => "line",
            DrawingObject::Rect { .. } => "rect",
            DrawingObject::Circle { .. } => "circle",
            DrawingObject::Polygon { .. } => "polygon",
            DrawingObject::Image { .. } => "image",
        }
    }
}

/// Versioned object list used to seed a fresh drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialDrawing {
    pub version: String,
    pub objects: Vec<DrawingObject>,
}

impl InitialDrawing {
    pub fn new(objects: Vec<DrawingObject>) -> Self {
        Self {
            version: DRAWING_FORMAT_VERSION.to_string(),
            objects,
        }
    }
}

/// Build the background object that seeds a surface with an existing mask.
///
/// The mask is resampled to `size` and placed at the origin covering the
/// whole canvas.
pub fn mask_background_object(mask: &Mask, size: Size) -> Result<DrawingObject, MaskError> {
    let resized = scale_mask(mask, size)?;
    Ok(DrawingObject::Image {
        version: DRAWING_FORMAT_VERSION.to_string(),
        left: 0.0,
        top: 0.0,
        width: size.width(),
        height: size.height(),
        scale_x: 1.0,
        scale_y: 1.0,
        src: to_data_url(&resized.to_base64_png()?),
    })
}

// ============================================================================
// Rasterization
// ============================================================================

/// Paints drawing objects onto a transparent RGBA buffer.
pub struct Canvas {
    buffer: RgbaImage,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            buffer: RgbaImage::new(size.width(), size.height()),
        }
    }

    /// Render `objects` in order onto a fresh canvas of `size`.
    pub fn rasterize(objects: &[DrawingObject], size: Size) -> Result<RgbaImage, MaskError> {
        let mut canvas = Self::new(size);
        for object in objects {
            canvas.paint(object)?;
        }
        Ok(canvas.into_buffer())
    }

    pub fn into_buffer(self) -> RgbaImage {
        self.buffer
    }

    /// Canvas bounds in pixel centres, grown by `margin` on every side.
    fn clip_box(&self, margin: f64) -> ClipBox {
        ClipBox {
            min_x: -margin,
            min_y: -margin,
            max_x: f64::from(self.buffer.width()) - 1.0 + margin,
            max_y: f64::from(self.buffer.height()) - 1.0 + margin,
        }
    }

    /// Intersect the half-open pixel span `[left, right) x [top, bottom)`
    /// with the canvas.
    fn clip_rect(&self, left: f64, top: f64, right: f64, bottom: f64) -> Option<Rect> {
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (bw, bh) = (
            f64::from(self.buffer.width()),
            f64::from(self.buffer.height()),
        );
        let (x0, x1) = (left.max(0.0).floor(), right.min(bw).ceil());
        let (y0, y1) = (top.max(0.0).floor(), bottom.min(bh).ceil());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect::at(x0 as i32, y0 as i32).of_size((x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// Paint one object.
    ///
    /// Colours that fail to parse fall back to the default stroke/fill so a
    /// drawn object always leaves a mark. Geometry is clipped to the canvas
    /// first, so the work done never exceeds the canvas area.
    pub fn paint(&mut self, object: &DrawingObject) -> Result<(), MaskError> {
        match object {
            DrawingObject::Path {
                points,
                stroke,
                stroke_width,
            } => {
                let color = stroke_color(stroke);
                self.stroke_polyline(points, *stroke_width, color, false);
            }
            DrawingObject::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
                stroke_width,
            } => {
                let color = stroke_color(stroke);
                self.stroke_polyline(&[[*x1, *y1], [*x2, *y2]], *stroke_width, color, false);
            }
            DrawingObject::Rect {
                left,
                top,
                width,
                height,
                fill,
                stroke,
                stroke_width,
            } => {
                let (l, t) = (f64::from(left.round()), f64::from(top.round()));
                let w = f64::from(width.round().max(1.0));
                let h = f64::from(height.round().max(1.0));
                if let Some(rect) = self.clip_rect(l, t, l + w, t + h) {
                    draw_filled_rect_mut(&mut self.buffer, rect, fill_color(fill));
                }

                let (l, t, r, b) = (*left, *top, left + width, top + height);
                let outline = [[l, t], [r, t], [r, b], [l, b]];
                self.stroke_polyline(&outline, *stroke_width, stroke_color(stroke), true);
            }
            DrawingObject::Circle {
                left,
                top,
                radius,
                fill,
                stroke,
                stroke_width,
            } => {
                let cx = f64::from((left + radius).round());
                let cy = f64::from((top + radius).round());
                let half = stroke_width.max(0.0) / 2.0;
                self.fill_disc(cx, cy, f64::from((radius + half).round()), stroke_color(stroke));
                let inner = f64::from((radius - half).round());
                if inner > 0.0 {
                    self.fill_disc(cx, cy, inner, fill_color(fill));
                }
            }
            DrawingObject::Polygon {
                points,
                fill,
                stroke,
                stroke_width,
            } => {
                let clipped = self.clip_box(1.0).clip_polygon(points);
                let poly = polygon_vertices(&clipped);
                if poly.len() >= 3 {
                    draw_polygon_mut(&mut self.buffer, &poly, fill_color(fill));
                }
                self.stroke_polyline(points, *stroke_width, stroke_color(stroke), true);
            }
            DrawingObject::Image {
                left,
                top,
                width,
                height,
                scale_x,
                scale_y,
                src,
                ..
            } => {
                let decoded = decode_base64_png(src)?;
                let target_w = f64::from(*width) * f64::from(*scale_x);
                let target_h = f64::from(*height) * f64::from(*scale_y);
                self.replace_region(
                    &coverage_pixels(&decoded),
                    f64::from(left.round()),
                    f64::from(top.round()),
                    target_w,
                    target_h,
                );
            }
        }
        Ok(())
    }

    /// Fill the disc of `radius` around `(cx, cy)`.
    fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
        if radius < 0.0 {
            return;
        }
        let (left, top) = (cx - radius, cy - radius);
        let (right, bottom) = (cx + radius + 1.0, cy + radius + 1.0);
        let Some(rect) = self.clip_rect(left, top, right, bottom) else {
            return;
        };
        let r2 = radius * radius;
        for y in rect.top()..=rect.bottom() {
            let dy = f64::from(y) - cy;
            for x in rect.left()..=rect.right() {
                let dx = f64::from(x) - cx;
                if dx * dx + dy * dy <= r2 {
                    self.buffer.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    /// Stroke a polyline by stamping discs along it.
    ///
    /// A stroke of width `w` is `w` pixels across for odd widths; segments
    /// are clipped to the canvas grown by the brush radius before stamping.
    fn stroke_polyline(&mut self, points: &[[f32; 2]], width: f32, color: Rgba<u8>, closed: bool) {
        if points.is_empty() {
            return;
        }
        let width = width.max(STROKE_WIDTH_RANGE.0).min(STROKE_WIDTH_RANGE.1);
        let radius = ((width - 1.0) / 2.0).round();
        let bounds = self.clip_box(f64::from(radius) + 1.0);
        let radius = radius as i32;

        let mut segments: Vec<([f32; 2], [f32; 2])> =
            points.windows(2).map(|pair| (pair[0], pair[1])).collect();
        if closed && points.len() > 2 {
            segments.push((points[points.len() - 1], points[0]));
        }
        if segments.is_empty() {
            let [x, y] = points[0];
            if bounds.contains(x, y) {
                let center = (x.round() as i32, y.round() as i32);
                draw_filled_circle_mut(&mut self.buffer, center, radius, color);
            }
            return;
        }

        let step = (radius as f32 / 2.0).max(1.0);
        for (a, b) in segments {
            let Some((a, b)) = bounds.clip_segment(a, b) else {
                continue;
            };
            let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
            let length = (dx * dx + dy * dy).sqrt();
            let stamps = (length / step).ceil().max(1.0) as u32;
            for i in 0..=stamps {
                let t = i as f32 / stamps as f32;
                let center = (
                    (a[0] + dx * t).round() as i32,
                    (a[1] + dy * t).round() as i32,
                );
                draw_filled_circle_mut(&mut self.buffer, center, radius, color);
            }
        }
    }

    /// Place `source` over the `width x height` target at `(left, top)`,
    /// replacing what is there.
    ///
    /// Only the on-canvas part of the target is visited; each visible pixel
    /// takes its nearest source pixel.
    fn replace_region(&mut self, source: &RgbaImage, left: f64, top: f64, width: f64, height: f64) {
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        if !width.is_finite() || !height.is_finite() {
            return;
        }
        let width = width.round().max(1.0);
        let height = height.round().max(1.0);
        let Some(visible) = self.clip_rect(left, top, left + width, top + height) else {
            return;
        };

        let (sw, sh) = (f64::from(source.width()), f64::from(source.height()));
        for y in visible.top()..=visible.bottom() {
            let sy = ((f64::from(y) - top) * sh / height) as u32;
            let sy = sy.min(source.height() - 1);
            for x in visible.left()..=visible.right() {
                let sx = ((f64::from(x) - left) * sw / width) as u32;
                let sx = sx.min(source.width() - 1);
                self.buffer.put_pixel(x as u32, y as u32, *source.get_pixel(sx, sy));
            }
        }
    }
}

/// Axis-aligned clipping window in canvas coordinates, bounds inclusive.
#[derive(Debug, Clone, Copy)]
struct ClipBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl ClipBox {
    fn contains(&self, x: f32, y: f32) -> bool {
        let (x, y) = (f64::from(x), f64::from(y));
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Liang-Barsky clip of the segment `a -> b`. `None` when it misses the box.
    fn clip_segment(&self, a: [f32; 2], b: [f32; 2]) -> Option<([f32; 2], [f32; 2])> {
        if !a.iter().chain(&b).all(|v| v.is_finite()) {
            return None;
        }
        let (ax, ay) = (f64::from(a[0]), f64::from(a[1]));
        let (dx, dy) = (f64::from(b[0]) - ax, f64::from(b[1]) - ay);

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        let edges = [
            (-dx, ax - self.min_x),
            (dx, self.max_x - ax),
            (-dy, ay - self.min_y),
            (dy, self.max_y - ay),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let at = |t: f64| [(ax + t * dx) as f32, (ay + t * dy) as f32];
        Some((at(t0), at(t1)))
    }

    /// Sutherland-Hodgman clip of a closed polygon against the box.
    fn clip_polygon(&self, points: &[[f32; 2]]) -> Vec<[f32; 2]> {
        if !points.iter().flatten().all(|v| v.is_finite()) {
            return Vec::new();
        }
        let mut poly: Vec<[f64; 2]> = points
            .iter()
            .map(|[x, y]| [f64::from(*x), f64::from(*y)])
            .collect();

        let planes = [
            (0, self.min_x, true),
            (0, self.max_x, false),
            (1, self.min_y, true),
            (1, self.max_y, false),
        ];
        for (axis, limit, is_min) in planes {
            let inside = |p: &[f64; 2]| {
                if is_min {
                    p[axis] >= limit
                } else {
                    p[axis] <= limit
                }
            };
            let cross = |a: [f64; 2], b: [f64; 2]| {
                let t = (limit - a[axis]) / (b[axis] - a[axis]);
                [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])]
            };

            let input = std::mem::take(&mut poly);
            for (i, current) in input.iter().enumerate() {
                let previous = input[(i + input.len() - 1) % input.len()];
                match (inside(&previous), inside(current)) {
                    (true, true) => poly.push(*current),
                    (true, false) => poly.push(cross(previous, *current)),
                    (false, true) => {
                        poly.push(cross(previous, *current));
                        poly.push(*current);
                    }
                    (false, false) => {}
                }
            }
        }

        poly.into_iter()
            .map(|[x, y]| [x as f32, y as f32])
            .collect()
    }
}

fn stroke_color(css: &str) -> Rgba<u8> {
    parse_css_color(css)
        .or_else(|| parse_css_color(DEFAULT_STROKE_COLOR))
        .unwrap_or(Rgba([181, 181, 181, 128]))
}

fn fill_color(css: &str) -> Rgba<u8> {
    parse_css_color(css)
        .or_else(|| parse_css_color(DEFAULT_FILL_COLOR))
        .unwrap_or(Rgba([181, 181, 181, 204]))
}

/// Integer polygon vertices with consecutive duplicates and the closing
/// repeat removed.
fn polygon_vertices(points: &[[f32; 2]]) -> Vec<PixelPoint<i32>> {
    let mut poly: Vec<PixelPoint<i32>> = Vec::with_capacity(points.len());
    for [x, y] in points {
        let p = PixelPoint::new(x.round() as i32, y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    poly
}

/// Pixels an image object writes, at the source's own size.
///
/// Single-channel sources are masks: their luma becomes coverage (alpha), so
/// a seeded mask rasterizes back to the same mask.
fn coverage_pixels(image: &DynamicImage) -> RgbaImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => {
            let luma = image.to_luma8();
            RgbaImage::from_fn(luma.width(), luma.height(), |x, y| {
                let v = luma.get_pixel(x, y)[0];
                Rgba([v, v, v, v])
            })
        }
        _ => image.to_rgba8(),
    }
}
