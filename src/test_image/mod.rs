//! Test image generation.
//!
//! Synthetic images and offline collaborators shared by the unit tests, so
//! no test depends on the network or files on disk.

use image::{DynamicImage, Rgb, RgbImage};

use crate::codec::{encode_png_base64, to_data_url};
use crate::error::MaskError;
use crate::services::ImageFetcher;

/// Generate an RGB image with a distinct pattern per channel.
///
/// - Red: horizontal gradient
/// - Green: vertical gradient
/// - Blue: 16px checkerboard
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = if ((x / 16) + (y / 16)) % 2 == 0 { 200 } else { 40 };
        Rgb([r, g, b])
    })
}

/// Encode an image as a PNG data URL, the inline source format.
pub fn png_data_url(image: &RgbImage) -> String {
    let encoded = encode_png_base64(&DynamicImage::ImageRgb8(image.clone()))
        .expect("PNG encoding of an in-memory image");
    to_data_url(&encoded)
}

/// Fetcher for tests that must never touch the network.
pub struct NoNetwork;

impl ImageFetcher for NoNetwork {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, MaskError> {
        Err(MaskError::invalid_source(format!(
            "network disabled in tests: {}",
            url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_base64_png;

    #[test]
    fn test_gradient_channels() {
        let image = gradient(64, 32);
        assert_eq!(image.dimensions(), (64, 32));
        assert_eq!(image.get_pixel(0, 0)[0], 0);
        assert!(image.get_pixel(63, 0)[0] > 240);
        assert_ne!(image.get_pixel(0, 0)[2], image.get_pixel(16, 0)[2]);
    }

    #[test]
    fn test_data_url_decodes_back() {
        let image = gradient(20, 10);
        let decoded = decode_base64_png(&png_data_url(&image)).unwrap();
        assert_eq!(decoded.to_rgb8(), image);
    }
}
