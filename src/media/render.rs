//! Image sniffing and filter-effect rendering.
//!
//! Effects are small convolution kernels with a scale and an offset, the
//! same parameters the classic PIL `ImageFilter` built-ins use. Each output
//! channel is `sum(weight * neighbour) / scale + offset`, clamped to 0-255,
//! with out-of-bounds neighbours taken from the nearest edge pixel.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader, Rgb, RgbImage};

use crate::error::RenderError;
use crate::photo::FilterEffect;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Formats accepted for upload.
pub const SUPPORTED_FORMATS: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

/// Largest accepted image, in pixels (width * height).
///
/// The header is checked before any pixel data is inflated, so a small,
/// highly compressed file cannot claim a huge canvas.
pub const MAX_IMAGE_PIXELS: u64 = 40_000_000;

/// Check if a quality value is within the valid range.
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

// =============================================================================
// Sniffing
// =============================================================================

/// Header-level facts about an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// File extension used for media keys.
    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "png",
            _ => "jpg",
        }
    }
}

/// Detect the format and dimensions of `data` without decoding pixels.
pub fn sniff(data: &[u8]) -> Result<ImageInfo, RenderError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RenderError::Decode {
            message: e.to_string(),
        })?;

    let format = match reader.format() {
        Some(format) if SUPPORTED_FORMATS.contains(&format) => format,
        Some(format) => {
            return Err(RenderError::Decode {
                message: format!("unsupported image format: {:?}", format),
            })
        }
        None => {
            return Err(RenderError::Decode {
                message: "unrecognized image format".to_string(),
            })
        }
    };

    let (width, height) = reader.into_dimensions().map_err(|e| RenderError::Decode {
        message: e.to_string(),
    })?;

    if width == 0 || height == 0 {
        return Err(RenderError::Decode {
            message: "image has no pixels".to_string(),
        });
    }

    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_IMAGE_PIXELS {
        return Err(RenderError::Decode {
            message: format!(
                "image is {}x{} ({} pixels), limit is {}",
                width, height, pixels, MAX_IMAGE_PIXELS
            ),
        });
    }

    Ok(ImageInfo {
        format,
        width,
        height,
    })
}

// =============================================================================
// Kernels
// =============================================================================

struct Kernel {
    size: usize,
    weights: &'static [f32],
    scale: f32,
    offset: f32,
}

#[rustfmt::skip]
fn kernel_for(effect: FilterEffect) -> Kernel {
    match effect {
        FilterEffect::Blur => Kernel {
            size: 5,
            weights: &[
                1., 1., 1., 1., 1.,
                1., 0., 0., 0., 1.,
                1., 0., 0., 0., 1.,
                1., 0., 0., 0., 1.,
                1., 1., 1., 1., 1.,
            ],
            scale: 16.,
            offset: 0.,
        },
        FilterEffect::Contour => Kernel {
            size: 3,
            weights: &[-1., -1., -1., -1., 8., -1., -1., -1., -1.],
            scale: 1.,
            offset: 255.,
        },
        FilterEffect::Detail => Kernel {
            size: 3,
            weights: &[0., -1., 0., -1., 10., -1., 0., -1., 0.],
            scale: 6.,
            offset: 0.,
        },
        FilterEffect::EdgeEnhance => Kernel {
            size: 3,
            weights: &[-1., -1., -1., -1., 10., -1., -1., -1., -1.],
            scale: 2.,
            offset: 0.,
        },
        FilterEffect::EdgeEnhanceMore => Kernel {
            size: 3,
            weights: &[-1., -1., -1., -1., 9., -1., -1., -1., -1.],
            scale: 1.,
            offset: 0.,
        },
        FilterEffect::Emboss => Kernel {
            size: 3,
            weights: &[-1., 0., 0., 0., 1., 0., 0., 0., 0.],
            scale: 1.,
            offset: 128.,
        },
        FilterEffect::FindEdges => Kernel {
            size: 3,
            weights: &[-1., -1., -1., -1., 8., -1., -1., -1., -1.],
            scale: 1.,
            offset: 0.,
        },
        FilterEffect::Sharpen => Kernel {
            size: 3,
            weights: &[-2., -2., -2., -2., 32., -2., -2., -2., -2.],
            scale: 16.,
            offset: 0.,
        },
        FilterEffect::Smooth => Kernel {
            size: 3,
            weights: &[1., 1., 1., 1., 5., 1., 1., 1., 1.],
            scale: 13.,
            offset: 0.,
        },
        FilterEffect::SmoothMore => Kernel {
            size: 5,
            weights: &[
                1., 1.,  1., 1., 1.,
                1., 5.,  5., 5., 1.,
                1., 5., 44., 5., 1.,
                1., 5.,  5., 5., 1.,
                1., 1.,  1., 1., 1.,
            ],
            scale: 100.,
            offset: 0.,
        },
    }
}

fn convolve(src: &RgbImage, kernel: &Kernel) -> RgbImage {
    let (width, height) = src.dimensions();
    let radius = (kernel.size / 2) as i64;
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    RgbImage::from_fn(width, height, |x, y| {
        let mut acc = [0f32; 3];

        for ky in 0..kernel.size {
            for kx in 0..kernel.size {
                let weight = kernel.weights[ky * kernel.size + kx];
                if weight == 0.0 {
                    continue;
                }

                let sx = (x as i64 + kx as i64 - radius).clamp(0, max_x) as u32;
                let sy = (y as i64 + ky as i64 - radius).clamp(0, max_y) as u32;
                let pixel = src.get_pixel(sx, sy);

                for (channel, sum) in acc.iter_mut().enumerate() {
                    *sum += weight * f32::from(pixel[channel]);
                }
            }
        }

        Rgb(acc.map(|sum| (sum / kernel.scale + kernel.offset).round().clamp(0.0, 255.0) as u8))
    })
}

// =============================================================================
// Rendering
// =============================================================================

/// Apply `effect` to an RGB image.
pub fn apply_effect(image: &RgbImage, effect: FilterEffect) -> RgbImage {
    convolve(image, &kernel_for(effect))
}

/// Decode `source`, apply `effect`, and encode the result as JPEG.
///
/// # Errors
///
/// - `InvalidQuality` if `quality` is outside 1-100
/// - `Decode` if the source is not a supported image or exceeds [`MAX_IMAGE_PIXELS`]
/// - `Encode` if JPEG encoding fails
pub fn render_jpeg(source: &[u8], effect: FilterEffect, quality: u8) -> Result<Bytes, RenderError> {
    if !is_valid_quality(quality) {
        return Err(RenderError::InvalidQuality { quality });
    }

    // Bound the canvas before decoding
    sniff(source)?;

    let decoded = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| RenderError::Decode {
            message: e.to_string(),
        })?
        .decode()
        .map_err(|e| RenderError::Decode {
            message: e.to_string(),
        })?;

    let filtered = apply_effect(&decoded.to_rgb8(), effect);

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
    encoder
        .encode_image(&filtered)
        .map_err(|e| RenderError::Encode {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

/// A PNG holding only a header and an empty data chunk.
///
/// Enough for [`sniff`] to read the dimensions, for building oversized
/// fixtures without allocating their pixels.
#[cfg(test)]
pub(crate) fn png_header_only(width: u32, height: u32) -> Vec<u8> {
    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &byte in bytes {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let start = out.len();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let crc = crc32(&out[start..]);
        out.extend_from_slice(&crc.to_be_bytes());
    }

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // 8-bit grayscale, deflate, no filter, no interlace
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    chunk(&mut out, b"IHDR", &ihdr);
    chunk(&mut out, b"IDAT", &[]);
    chunk(&mut out, b"IEND", &[]);
    out
}

// =============================================================================
// Tests
// =============================================================================
