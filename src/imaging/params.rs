//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the output size) and the [`backend`](super::backend)
//! (which does the pixel work). Keeping them separate lets the operation
//! logic run against a recording mock in tests.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 75). Clamped on construction.
//! - [`EncodeParams`] — Bound on the longer edge plus quality; [`EncodeParams::product`] is the fixed product setting.
//! - [`ResizeParams`] — Full specification for one re-encode: source bytes, target dimensions, quality.

/// Longer-edge bound for stored product images, in pixels.
pub const PRODUCT_MAX_DIMENSION: u32 = 800;

/// JPEG quality for stored product images.
pub const PRODUCT_JPEG_QUALITY: u32 = 75;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(PRODUCT_JPEG_QUALITY)
    }
}

/// How an upload is normalized before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    /// Neither output dimension may exceed this.
    pub max_dimension: u32,
    pub quality: Quality,
}

impl EncodeParams {
    /// The fixed setting every product image goes through: 800px, JPEG q75.
    pub fn product() -> Self {
        Self {
            max_dimension: PRODUCT_MAX_DIMENSION,
            quality: Quality::new(PRODUCT_JPEG_QUALITY),
        }
    }
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self::product()
    }
}

/// Parameters for a single decode → resize → JPEG encode.
///
/// `width`/`height` are the exact output dimensions; the backend does no
/// aspect-ratio math of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams<'a> {
    pub source: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
