//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the product
//! pipeline needs from a codec: identify (header-only dimension read) and
//! resize (decode, resample, JPEG encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, built on
//! the `image` crate. Tests use the recording `MockBackend` below.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Both operations work on in-memory payloads; a backend never touches the
/// filesystem or the record store.
pub trait ImageBackend: Sync {
    /// Read image dimensions from the payload header without decoding pixels.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, resample to exactly `width`x`height` when that
    /// differs from the source, and return the JPEG-encoded result.
    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Bytes the mock returns from every `resize`.
    pub const MOCK_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it satisfies the `Sync` bound.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify {
            len: usize,
        },
        Resize {
            len: usize,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify { len: source.len() });

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::UnsupportedFormat("No mock dimensions".to_string()))
        }

        fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                len: params.source.len(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(MOCK_JPEG.to_vec())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(b"fake").unwrap();
        assert_eq!(result.as_tuple(), (800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify { len: 4 }]);
    }

    #[test]
    fn mock_identify_without_dimensions_is_unsupported() {
        let backend = MockBackend::new();
        let err = backend.identify(b"").unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedFormat(_)));
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();

        let out = backend
            .resize(&ResizeParams {
                source: b"source",
                width: 800,
                height: 400,
                quality: Quality::new(75),
            })
            .unwrap();
        assert_eq!(out, MOCK_JPEG);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                len: 6,
                width: 800,
                height: 400,
                quality: 75,
            }
        ));
    }
}
