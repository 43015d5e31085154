//! # Product Catalog
//!
//! A small product catalog: users register and log in for a bearer token,
//! then manage categories and products. Each product may carry one image,
//! and every image goes through the same normalization on the way in.
//!
//! # Architecture: Encode on Write, Display on Read
//!
//! ```text
//! upload bytes ──► imaging::encode_product_image ──► (bytes, mime, size) ──► db
//!                                                                             │
//! read response ◄── imaging::display_product_image ◄── stored triple ◄────────┘
//! ```
//!
//! Writes are all-or-nothing: the catalog validates fields, foreign keys and
//! the image before it touches the record store, so a rejected upload never
//! leaves a half-updated row.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Identify, bound to 800px, re-encode as JPEG q75; render data URIs |
//! | [`types`] | Shared value types: the image triple, `ImageDisplay`, `Price` |
//! | [`catalog`] | Product and category operations over the record store |
//! | [`auth`] | Registration, login, bearer-token validation, logout |
//! | [`db`] | Versioned JSON snapshot of users, sessions, categories, products |
//! | [`config`] | `catalog.toml` loading, validation, and merging over stock defaults |
//! | [`logging`] | `tracing` subscriber setup (pretty or JSON, stderr) |
//! | [`output`] | CLI output formatting for catalog entities |
//!
//! # Design Decisions
//!
//! ## One Output Format
//!
//! Every stored image is a baseline JPEG, whatever was uploaded. Consumers
//! only ever see `image/jpeg`, and the stored size is bounded: the longer
//! edge is at most 800px and quality is fixed at 75. Smaller images are
//! re-encoded but never upscaled. Transparency is flattened onto white
//! because JPEG has no alpha channel.
//!
//! ## The Triple Is One Value
//!
//! The three image columns (`image`, `image_mime_type`, `image_size`) are
//! either all set or all null. [`types::ProductImage`] is the only way to
//! produce them, and the size is always derived from the bytes, so the
//! columns cannot drift apart.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and JPEG encoding all come from the `image`
//! crate. No system libraries are needed. The [`imaging::ImageBackend`] trait
//! sits at the codec seam so catalog logic is tested against a recording mock.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
