//! Image processing for product uploads — pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` (header only) |
//! | **Bound** | [`calculate_bounded_dimensions`] (longer edge ≤ 800, no upscale) |
//! | **Re-encode** | Lanczos3 resize + JPEG encoder at quality 75 |
//! | **Display** | `data:image/jpeg;base64,...` via the `base64` crate |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`encode_product_image`] and [`display_product_image`]

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_bounded_dimensions;
pub use operations::{
    BASE64_MARKER, DATA_URI_PREFIX, ImageError, OUTPUT_MIME_TYPE, display_product_image,
    encode_image, encode_product_image,
};
pub use params::{EncodeParams, PRODUCT_JPEG_QUALITY, PRODUCT_MAX_DIMENSION, Quality};
pub use rust_backend::RustBackend;
