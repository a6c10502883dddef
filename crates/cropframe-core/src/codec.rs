//! Source decoding and export encoding.
//!
//! The renderer works on RGB [`RasterImage`] buffers. This module produces
//! them from encoded source bytes and turns an exported crop back into a
//! JPEG or PNG file, using the `image` crate's codecs.

use crate::raster::RasterImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError, ImageReader};
use std::io::Cursor;
use thiserror::Error;

/// Errors from decoding or encoding image files.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not in a recognized format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The file is recognized but corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Pixel data length doesn't match the dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder failed.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Decode JPEG or PNG bytes into an RGB raster.
///
/// The format is sniffed from the content.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage, CodecError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CodecError::CorruptedFile(e.to_string()))?;

    let img = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(_) => CodecError::InvalidFormat,
        other => CodecError::CorruptedFile(other.to_string()),
    })?;

    Ok(RasterImage::from_rgb_image(img.into_rgb8()))
}

fn check_raster(image: &RasterImage) -> Result<(), CodecError> {
    if image.width == 0 || image.height == 0 {
        return Err(CodecError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }
    let expected = image.width as usize * image.height as usize * 3;
    if image.pixels.len() != expected {
        return Err(CodecError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }
    Ok(())
}

/// Encode a raster as JPEG.
///
/// `quality` is clamped to 1-100.
pub fn encode_jpeg(image: &RasterImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    check_raster(image)?;

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode a raster as lossless PNG.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, CodecError> {
    check_raster(image)?;

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128]);
            }
        }
        RasterImage::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_png_is_lossless() {
        let img = gradient(17, 9);
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(decode_image(&png).unwrap(), img);
    }

    #[test]
    fn test_jpeg_markers_and_dimensions() {
        let img = gradient(40, 30);
        let jpeg = encode_jpeg(&img, 90).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);

        let decoded = decode_image(&jpeg).unwrap();
        assert_eq!((decoded.width, decoded.height), (40, 30));
    }

    #[test]
    fn test_decode_garbage_is_invalid_format() {
        assert!(matches!(
            decode_image(&[0x00, 0x01, 0x02, 0x03]),
            Err(CodecError::InvalidFormat)
        ));
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_file() {
        let png = encode_png(&gradient(8, 8)).unwrap();
        assert!(matches!(
            decode_image(&png[..png.len() / 2]),
            Err(CodecError::CorruptedFile(_))
        ));
    }

    #[test]
    fn test_encode_rejects_empty_raster() {
        assert!(matches!(
            encode_jpeg(&RasterImage::empty(), 90),
            Err(CodecError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encode_png(&RasterImage::empty()),
            Err(CodecError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let bad = RasterImage {
            width: 2,
            height: 2,
            pixels: vec![0; 5],
        };
        assert!(matches!(
            encode_jpeg(&bad, 90),
            Err(CodecError::InvalidPixelData {
                expected: 12,
                actual: 5
            })
        ));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
