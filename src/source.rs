//! Image source resolution and display normalization.
//!
//! A source string is either an HTTP(S) URL or inline base64 image data
//! (optionally data-URL prefixed). Loaded images are converted to RGB and a
//! display copy is downscaled so its longest edge is at most the configured
//! limit. The original is kept as the source of truth for final output.

use image::RgbImage;
use image::imageops::FilterType;

use crate::codec::decode_base64_bytes;
use crate::error::MaskError;
use crate::geometry::Size;
use crate::services::ImageFetcher;

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote image fetched with a GET
    Url(String),
    /// Inline base64 payload, possibly with a data-URL prefix
    Inline(String),
}

impl ImageSource {
    /// Classify a source string. Anything starting with `http` is a URL.
    pub fn parse(input: &str) -> Result<Self, MaskError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MaskError::invalid_source("no image source provided"));
        }
        if trimmed.starts_with("http") {
            Ok(ImageSource::Url(trimmed.to_string()))
        } else {
            Ok(ImageSource::Inline(trimmed.to_string()))
        }
    }

    /// The source string as given, used when submitting.
    pub fn as_str(&self) -> &str {
        match self {
            ImageSource::Url(s) | ImageSource::Inline(s) => s,
        }
    }

    /// Short description for logs; inline payloads are not printed.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Inline(data) => format!("<inline image, {} chars>", data.len()),
        }
    }
}

/// An image slot's raster variants.
#[derive(Debug, Clone)]
pub struct SlotImage {
    source: ImageSource,
    original: RgbImage,
    display: RgbImage,
    natural_size: Size,
    display_size: Size,
}

impl SlotImage {
    /// Build from an already decoded original.
    pub fn from_original(
        source: ImageSource,
        original: RgbImage,
        max_edge: u32,
    ) -> Result<Self, MaskError> {
        let natural_size = Size::of(&original)?;
        let display = resize_to_max_edge(&original, max_edge)?;
        let display_size = Size::of(&display)?;
        Ok(Self {
            source,
            original,
            display,
            natural_size,
            display_size,
        })
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn original(&self) -> &RgbImage {
        &self.original
    }

    pub fn display(&self) -> &RgbImage {
        &self.display
    }

    /// Natural (original) size.
    pub fn natural_size(&self) -> Size {
        self.natural_size
    }

    /// Display (canvas) size.
    pub fn display_size(&self) -> Size {
        self.display_size
    }

    /// Display image resampled to the model's square input.
    pub fn model_input(&self, side: u32) -> Result<RgbImage, MaskError> {
        let size = Size::square(side)?;
        Ok(image::imageops::resize(
            &self.display,
            size.width(),
            size.height(),
            FilterType::Lanczos3,
        ))
    }
}

/// Downscale so the longest edge is at most `max_edge`.
///
/// Images already within the limit are returned unchanged. New dimensions are
/// truncated (`floor(w * ratio)`), never below one pixel.
pub fn resize_to_max_edge(image: &RgbImage, max_edge: u32) -> Result<RgbImage, MaskError> {
    let size = Size::of(image)?;
    if max_edge == 0 {
        return Err(MaskError::Config("max image edge must be positive".to_string()));
    }
    if size.longest_edge() <= max_edge {
        return Ok(image.clone());
    }

    let ratio = f64::from(max_edge) / f64::from(size.longest_edge());
    let width = ((f64::from(size.width()) * ratio) as u32).max(1);
    let height = ((f64::from(size.height()) * ratio) as u32).max(1);
    log::debug!("Resizing {} -> {}x{}", size, width, height);

    Ok(image::imageops::resize(image, width, height, FilterType::Lanczos3))
}

/// Decode image bytes into RGB.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<RgbImage, MaskError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| MaskError::invalid_source(format!("failed to decode image: {}", e)))?;
    Ok(image.to_rgb8())
}

/// Resolve a source into a loaded slot image.
pub fn load_image(
    source: ImageSource,
    fetcher: &dyn ImageFetcher,
    max_edge: u32,
) -> Result<SlotImage, MaskError> {
    let bytes = match &source {
        ImageSource::Url(url) => fetcher.fetch(url)?,
        ImageSource::Inline(data) => decode_base64_bytes(data)
            .map_err(|e| MaskError::invalid_source(format!("invalid inline image: {}", e)))?,
    };

    let original = decode_image_bytes(&bytes)?;
    let image = SlotImage::from_original(source, original, max_edge)?;
    log::info!(
        "Loaded {} ({} natural, {} display)",
        image.source.describe(),
        image.natural_size(),
        image.display_size()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::{NoNetwork, gradient, png_data_url};

    #[test]
    fn test_parse_source_kinds() {
        assert_eq!(
            ImageSource::parse("https://example.com/a.png").unwrap(),
            ImageSource::Url("https://example.com/a.png".to_string())
        );
        assert!(matches!(
            ImageSource::parse("data:image/png;base64,AAAA").unwrap(),
            ImageSource::Inline(_)
        ));
        assert!(matches!(
            ImageSource::parse("   "),
            Err(MaskError::InvalidImageSource { .. })
        ));
    }

    #[test]
    fn test_small_image_kept_as_is() {
        let image = gradient(400, 300);
        let resized = resize_to_max_edge(&image, 512).unwrap();
        assert_eq!(resized.dimensions(), (400, 300));
        assert_eq!(resized, image);
    }

    #[test]
    fn test_large_image_downscaled_preserving_aspect() {
        let image = gradient(1000, 700);
        let resized = resize_to_max_edge(&image, 512).unwrap();
        // 700 * 0.512 = 358.4 -> 358
        assert_eq!(resized.dimensions(), (512, 358));

        let tall = resize_to_max_edge(&gradient(300, 1024), 512).unwrap();
        assert_eq!(tall.dimensions(), (150, 512));
    }

    #[test]
    fn test_load_inline_source() {
        let source = ImageSource::parse(&png_data_url(&gradient(640, 480))).unwrap();
        let image = load_image(source, &NoNetwork, 512).unwrap();

        assert_eq!(image.natural_size().as_tuple(), (640, 480));
        assert_eq!(image.display_size().as_tuple(), (512, 384));
        assert_eq!(image.model_input(256).unwrap().dimensions(), (256, 256));
    }

    #[test]
    fn test_load_rejects_non_image() {
        let source = ImageSource::Inline("aGVsbG8=".to_string());
        assert!(matches!(
            load_image(source, &NoNetwork, 512),
            Err(MaskError::InvalidImageSource { .. })
        ));
    }

    #[test]
    fn test_url_source_uses_fetcher() {
        let source = ImageSource::parse("http://localhost/missing.png").unwrap();
        let err = load_image(source, &NoNetwork, 512).unwrap_err();
        assert!(matches!(err, MaskError::InvalidImageSource { .. }));
    }
}
