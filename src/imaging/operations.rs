//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They are
//! the two entry points the catalog uses: [`encode_product_image`] on the
//! write path (create/update) and [`display_product_image`] on the read path.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_bounded_dimensions, needs_resize};
use super::params::{EncodeParams, ResizeParams};
use crate::types::{ImageDisplay, ProductImage};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::debug;

/// MIME type of every stored product image.
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

/// Scheme prefix of an inline data URI.
pub const DATA_URI_PREFIX: &str = "data:";

/// Separator between the MIME type and the base64 payload.
pub const BASE64_MARKER: &str = ";base64,";

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image: unsupported image format ({0})")]
    UnsupportedImageFormat(String),
    #[error("image: encoding failed ({0})")]
    EncodeFailed(String),
    #[error("image: stored columns are inconsistent ({0})")]
    InconsistentColumns(String),
}

impl From<BackendError> for ImageError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::UnsupportedFormat(msg) => Self::UnsupportedImageFormat(msg),
            BackendError::ProcessingFailed(msg) => Self::EncodeFailed(msg),
        }
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Plan a re-encode without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_resize<'a>(
    source: &'a [u8],
    original: (u32, u32),
    params: &EncodeParams,
) -> ResizeParams<'a> {
    let (width, height) = calculate_bounded_dimensions(original, params.max_dimension);
    ResizeParams {
        source,
        width,
        height,
        quality: params.quality,
    }
}

/// Normalize an upload into a stored-image triple using `params`.
///
/// `None` yields the all-null triple. A payload that cannot be identified or
/// decoded fails with [`ImageError::UnsupportedImageFormat`]; nothing is
/// returned in that case, so callers cannot store a partial result.
pub fn encode_image(
    backend: &impl ImageBackend,
    payload: Option<&[u8]>,
    params: &EncodeParams,
) -> Result<ProductImage> {
    let Some(source) = payload else {
        return Ok(ProductImage::none());
    };

    let original = backend.identify(source)?.as_tuple();
    let plan = plan_resize(source, original, params);
    debug!(
        original_width = original.0,
        original_height = original.1,
        width = plan.width,
        height = plan.height,
        resampled = needs_resize(original, (plan.width, plan.height)),
        "encoding image"
    );

    let bytes = backend.resize(&plan)?;
    if bytes.is_empty() {
        return Err(ImageError::EncodeFailed(
            "encoder produced no output".into(),
        ));
    }
    Ok(ProductImage::encoded(bytes))
}

/// Normalize a product upload: longer edge at most 800px, JPEG at quality 75.
pub fn encode_product_image(
    backend: &impl ImageBackend,
    payload: Option<&[u8]>,
) -> Result<ProductImage> {
    encode_image(backend, payload, &EncodeParams::product())
}

/// Render a stored triple for a read response.
///
/// Present images become `data:<mime>;base64,<payload>`; the all-null triple
/// becomes [`ImageDisplay::NoImage`]. Never fails.
pub fn display_product_image(image: &ProductImage) -> ImageDisplay {
    match image.stored() {
        Some(stored) => ImageDisplay::DataUri(format!(
            "{}{}{}{}",
            DATA_URI_PREFIX,
            stored.mime_type(),
            BASE64_MARKER,
            STANDARD.encode(stored.bytes())
        )),
        None => ImageDisplay::NoImage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MOCK_JPEG, MockBackend, RecordedOp};

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn plan_resize_bounds_landscape() {
        let plan = plan_resize(b"src", (2000, 1000), &EncodeParams::product());
        assert_eq!((plan.width, plan.height), (800, 400));
        assert_eq!(plan.quality.value(), 75);
    }

    #[test]
    fn plan_resize_keeps_small_image() {
        let plan = plan_resize(b"src", (400, 300), &EncodeParams::product());
        assert_eq!((plan.width, plan.height), (400, 300));
    }

    #[test]
    fn encode_absent_payload_is_all_null_and_skips_backend() {
        let backend = MockBackend::new();
        let image = encode_product_image(&backend, None).unwrap();
        assert_eq!(image, ProductImage::none());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn encode_identifies_then_resizes() {
        let backend = MockBackend::with_dimensions(vec![dims(2000, 1000)]);
        let image = encode_product_image(&backend, Some(b"payload")).unwrap();

        assert_eq!(image.encoded_bytes(), Some(MOCK_JPEG));
        assert_eq!(image.mime_type(), Some("image/jpeg"));
        assert_eq!(image.byte_size(), Some(MOCK_JPEG.len() as u64));

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![
                RecordedOp::Identify { len: 7 },
                RecordedOp::Resize {
                    len: 7,
                    width: 800,
                    height: 400,
                    quality: 75,
                },
            ]
        );
    }

    #[test]
    fn encode_unidentifiable_payload_fails_before_resize() {
        let backend = MockBackend::new();
        let err = encode_product_image(&backend, Some(b"junk")).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedImageFormat(_)));
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn encode_with_custom_params() {
        let backend = MockBackend::with_dimensions(vec![dims(1000, 500)]);
        let params = EncodeParams {
            max_dimension: 100,
            quality: crate::imaging::Quality::new(40),
        };
        encode_image(&backend, Some(b"x"), &params).unwrap();
        assert!(matches!(
            backend.get_operations()[1],
            RecordedOp::Resize {
                width: 100,
                height: 50,
                quality: 40,
                ..
            }
        ));
    }

    #[test]
    fn display_all_null_is_no_image() {
        assert_eq!(
            display_product_image(&ProductImage::none()),
            ImageDisplay::NoImage
        );
    }

    #[test]
    fn display_builds_data_uri() {
        let image = ProductImage::encoded(b"hello".to_vec());
        assert_eq!(
            display_product_image(&image),
            ImageDisplay::DataUri("data:image/jpeg;base64,aGVsbG8=".into())
        );
    }

    #[test]
    fn display_uses_stored_mime_type() {
        let mime = Some("image/png".to_string());
        let image = ProductImage::from_columns(Some(vec![0, 1]), mime, Some(2)).unwrap();
        let shown = display_product_image(&image);
        let uri = shown.as_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn backend_errors_map_to_image_errors() {
        let err: ImageError = BackendError::ProcessingFailed("boom".into()).into();
        assert!(matches!(err, ImageError::EncodeFailed(m) if m == "boom"));
    }
}
