//! Global constants for mask annotation

/// Longest edge, in pixels, of a display-resolution image
pub const DEFAULT_MAX_IMAGE_EDGE: u32 = 512;

/// Side length of the square model-input space
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 512;

/// Model-input sizes the segmentation service accepts
pub const SUPPORTED_MODEL_INPUT_SIZES: &[u32] = &[256, 512];

/// Pixel value of a foreground mask pixel
pub const MASK_FOREGROUND: u8 = 255;

/// Pixel value of a background mask pixel
pub const MASK_BACKGROUND: u8 = 0;

/// Default overlay tint (red)
pub const DEFAULT_OVERLAY_COLOR: [u8; 3] = [255, 0, 0];

/// Default overlay fill alpha
pub const DEFAULT_OVERLAY_OPACITY: u8 = 128;

/// Polygon approximation tolerance for mask borders, in pixels
pub const CONTOUR_EPSILON: f64 = 1.5;

/// Version string written into drawing-surface object lists
pub const DRAWING_FORMAT_VERSION: &str = "4.4.0";

/// Default stroke width for freehand drawing
pub const DEFAULT_STROKE_WIDTH: f32 = 75.0;

/// Allowed stroke width range
pub const STROKE_WIDTH_RANGE: (f32, f32) = (1.0, 150.0);

/// Default stroke colour (grey at half alpha)
pub const DEFAULT_STROKE_COLOR: &str = "#B5B5B580";

/// Default shape fill colour
pub const DEFAULT_FILL_COLOR: &str = "rgba(181, 181, 181, 0.8)";

/// Default timeout for segmentation and submission requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
