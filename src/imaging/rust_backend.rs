//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `image::ImageReader::with_guessed_format` (magic bytes) |
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Alpha flattening | composite over white, in place of the alpha channel |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a payload with its format guessed from magic bytes.
///
/// The payload's claimed file name or content type is never consulted.
fn open_reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    if source.is_empty() {
        return Err(BackendError::UnsupportedFormat("empty payload".into()));
    }
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::UnsupportedFormat(e.to_string()))?;
    if reader.format().is_none() {
        return Err(BackendError::UnsupportedFormat(
            "unrecognized image signature".into(),
        ));
    }
    Ok(reader)
}

fn unsupported(context: &str, e: image::ImageError) -> BackendError {
    BackendError::UnsupportedFormat(format!("{context}: {e}"))
}

/// Decode a payload into pixels.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    open_reader(source)?
        .decode()
        .map_err(|e| unsupported("Failed to decode", e))
}

/// Reduce an image to a pixel layout JPEG can carry (8-bit gray or RGB).
///
/// Transparent pixels are composited over white.
fn flatten_for_jpeg(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other if other.color().has_alpha() => {
            DynamicImage::ImageRgb8(composite_over_white(&other.into_rgba8()))
        }
        other => DynamicImage::ImageRgb8(other.into_rgb8()),
    }
}

fn composite_over_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode to an in-memory JPEG buffer.
fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100) as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buffer)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(source)?
            .into_dimensions()
            .map_err(|e| unsupported("Failed to read dimensions", e))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        // The decoded source is dropped at the end of this block, so at most
        // one pixel buffer is alive when encoding starts.
        let img = {
            let decoded = load_image(params.source)?;
            if (decoded.width(), decoded.height()) == (params.width, params.height) {
                decoded
            } else {
                decoded.resize_exact(params.width, params.height, FilterType::Lanczos3)
            }
        };
        let flattened = flatten_for_jpeg(img);
        encode_jpeg(&flattened, params.quality.value())
    }
}
