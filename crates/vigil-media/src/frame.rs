//! Decoded video frame and transport encoding helpers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;

use crate::error::MediaResult;

/// JPEG quality used for relayed live frames.
pub const STREAM_JPEG_QUALITY: u8 = 70;

/// Downscale factor applied to relayed live frames.
pub const STREAM_SCALE: f32 = 0.8;

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based index within the source
    pub index: u64,
    /// Pixel data
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as JPEG at the given quality.
    pub fn to_jpeg(&self, quality: u8) -> MediaResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder.encode_image(&self.image)?;
        Ok(buf)
    }

    /// Downscale by a factor in (0, 1].
    pub fn downscale(&self, factor: f32) -> Frame {
        let width = ((self.width() as f32 * factor) as u32).max(1);
        let height = ((self.height() as f32 * factor) as u32).max(1);
        Frame {
            index: self.index,
            image: image::imageops::resize(&self.image, width, height, FilterType::Triangle),
        }
    }

    /// Downscaled, JPEG-compressed, base64 payload for the event channel.
    pub fn to_transport_payload(&self) -> MediaResult<String> {
        let jpeg = self.downscale(STREAM_SCALE).to_jpeg(STREAM_JPEG_QUALITY)?;
        Ok(BASE64.encode(jpeg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: u32, h: u32) -> Frame {
        Frame::new(0, RgbImage::from_pixel(w, h, image::Rgb([40, 90, 200])))
    }

    #[test]
    fn test_jpeg_encode_produces_jpeg_magic() {
        let jpeg = solid_frame(64, 48).to_jpeg(80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_downscale_dimensions() {
        let small = solid_frame(100, 50).downscale(0.8);
        assert_eq!(small.width(), 80);
        assert_eq!(small.height(), 40);
    }

    #[test]
    fn test_transport_payload_is_base64() {
        let payload = solid_frame(32, 32).to_transport_payload().unwrap();
        assert!(!payload.is_empty());
        assert!(payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }
}
