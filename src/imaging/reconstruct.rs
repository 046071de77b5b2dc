//! Reconstruction of displayable images from snapshot captures.
//!
//! Pipeline per capture:
//! 1. DECODE: raw buffers are reinterpreted as rows x cols x channels when the
//!    length matches the declared shape; anything else goes through the
//!    general codec
//! 2. ROTATE: per-source right-angle correction
//! 3. ENCODE: JPEG at the configured quality
//!
//! Every step is pure; a failure affects only the capture being processed.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use thiserror::Error;

use super::rotation::rotation_or_warn;
use crate::graph::{ImageCapture, ImageEncoding};

/// Default JPEG quality for transport.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Why a single capture could not be turned into an image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Raw buffer could not be laid out with its declared shape.
    #[error("raw buffer of {len} bytes does not fit {rows}x{cols}x{channels}")]
    ShapeMismatch {
        len: usize,
        rows: u32,
        cols: u32,
        channels: usize,
    },

    /// The general codec rejected the bytes.
    #[error("codec decode failed: {0}")]
    Codec(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),
}

/// Which decode path produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    /// Direct reinterpretation of a raw buffer.
    Raw,
    /// General image codec.
    Codec,
}

/// A decoded capture, before rotation.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub image: DynamicImage,
    pub path: DecodePath,
}

/// JPEG bytes ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl EncodedImage {
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.jpeg)
    }
}

/// Stateless decode/rotate/encode pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ImageReconstructor {
    jpeg_quality: u8,
}

impl Default for ImageReconstructor {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageReconstructor {
    /// Quality is clamped to the JPEG range 1..=100.
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Full pipeline for one capture.
    pub fn reconstruct(&self, capture: &ImageCapture) -> Result<EncodedImage, ImageError> {
        let decoded = decode(capture)?;
        let rotated = rotation_or_warn(&capture.source).apply(decoded.image);
        let jpeg = self.encode(&rotated)?;

        Ok(EncodedImage {
            source: capture.source.clone(),
            width: rotated.width(),
            height: rotated.height(),
            jpeg,
        })
    }

    /// JPEG-encode an image. Grayscale stays single-channel; color drops alpha.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
        let mut jpeg = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality);
            let result = if image.color().has_color() {
                encoder.encode_image(&image.to_rgb8())
            } else {
                encoder.encode_image(&to_gray8(image))
            };
            result.map_err(|e| ImageError::Encode(e.to_string()))?;
        }
        Ok(jpeg)
    }
}

/// Decode a capture according to its encoding, without rotation.
pub fn decode(capture: &ImageCapture) -> Result<Decoded, ImageError> {
    match capture.encoding {
        ImageEncoding::Raw => match decode_raw(capture) {
            Ok(image) => Ok(Decoded {
                image,
                path: DecodePath::Raw,
            }),
            Err(ImageError::ShapeMismatch { .. }) => decode_codec(&capture.data),
            Err(e) => Err(e),
        },
        ImageEncoding::Compressed => decode_codec(&capture.data),
    }
}

fn decode_codec(data: &[u8]) -> Result<Decoded, ImageError> {
    let image = image::load_from_memory(data).map_err(|e| ImageError::Codec(e.to_string()))?;
    Ok(Decoded {
        image,
        path: DecodePath::Codec,
    })
}

/// Reinterpret a raw buffer with its declared shape.
///
/// Color buffers arrive in blue-green-red(-alpha) order and are reordered to
/// RGB(A). 16-bit samples are little-endian.
fn decode_raw(capture: &ImageCapture) -> Result<DynamicImage, ImageError> {
    let layout = capture.pixel_format.layout();
    let (rows, cols) = (capture.rows, capture.cols);
    let mismatch = || ImageError::ShapeMismatch {
        len: capture.data.len(),
        rows,
        cols,
        channels: layout.channels,
    };

    if rows == 0 || cols == 0 || layout.expected_len(rows, cols) != Some(capture.data.len()) {
        return Err(mismatch());
    }

    let data = &capture.data;
    let image = match (layout.channels, layout.bytes_per_sample) {
        (1, 1) => GrayImage::from_raw(cols, rows, data.clone()).map(DynamicImage::ImageLuma8),
        (1, 2) => {
            let samples: Vec<u16> = data
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect();
            ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(cols, rows, samples)
                .map(DynamicImage::ImageLuma16)
        }
        (3, 1) => {
            let mut rgb = RgbImage::new(cols, rows);
            for (px, bgr) in rgb.pixels_mut().zip(data.chunks_exact(3)) {
                *px = Rgb([bgr[2], bgr[1], bgr[0]]);
            }
            Some(DynamicImage::ImageRgb8(rgb))
        }
        (4, 1) => {
            let mut rgba = RgbaImage::new(cols, rows);
            for (px, bgra) in rgba.pixels_mut().zip(data.chunks_exact(4)) {
                *px = Rgba([bgra[2], bgra[1], bgra[0], bgra[3]]);
            }
            Some(DynamicImage::ImageRgba8(rgba))
        }
        (channels, width) => {
            return Err(ImageError::UnsupportedLayout(format!(
                "{} channels of {} bytes ({:?})",
                channels, width, capture.pixel_format
            )));
        }
    };

    image.ok_or_else(mismatch)
}

/// Reduce any grayscale image to 8 bits; 16-bit samples keep their high byte.
fn to_gray8(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma16(img) => {
            GrayImage::from_fn(img.width(), img.height(), |x, y| {
                Luma([(img.get_pixel(x, y)[0] >> 8) as u8])
            })
        }
        DynamicImage::ImageLumaA16(img) => {
            GrayImage::from_fn(img.width(), img.height(), |x, y| {
                Luma([(img.get_pixel(x, y)[0] >> 8) as u8])
            })
        }
        other => other.to_luma8(),
    }
}
