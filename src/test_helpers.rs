//! Shared test utilities for the product-catalog test suite.
//!
//! Provides synthetic image payloads (encoded in memory with the `image`
//! crate), fixed clocks, and pre-seeded databases so unit tests can exercise
//! catalog logic without touching the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (mut db, seed) = seeded_db();
//! let png = synthetic_png(2000, 1000);
//! assert_eq!(decoded_dimensions(&png), (2000, 1000));
//! ```

use chrono::{DateTime, TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

use crate::auth::Registration;
use crate::db::{CategoryRecord, Database, ProductRecord, Table, UserRecord};
use crate::types::Price;

// =========================================================================
// Synthetic images
// =========================================================================

/// Gradient with a deterministic texture so JPEG quality visibly matters.
fn textured(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let mixed = x.wrapping_mul(31) ^ y.wrapping_mul(17);
        let noise = (mixed.wrapping_mul(2654435761) >> 24) as u8;
        Rgb([
            (x * 255 / width.max(1)) as u8 ^ (noise & 0x3F),
            (y * 255 / height.max(1)) as u8 ^ (noise >> 2),
            noise,
        ])
    })
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn synthetic_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(textured(width, height));
    encode(img, ImageFormat::Png)
}

pub fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(textured(width, height));
    encode(img, ImageFormat::Jpeg)
}

/// Solid black RGBA PNG with every pixel at the given alpha.
pub fn synthetic_rgba_png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, alpha]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Decode `bytes` fully and return its dimensions.
pub fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

// =========================================================================
// Records and fixtures
// =========================================================================

/// A fixed instant so timestamps and expiry checks are deterministic.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn price(value: &str) -> Price {
    value.parse().unwrap()
}

pub fn registration(name: &str, email: &str, password: &str) -> Registration {
    Registration {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

/// Product row with a consistent image triple (or none) owned by user 1
/// in category 1.
pub fn sample_product_record(id: u64, image: Option<Vec<u8>>) -> ProductRecord {
    let image_mime_type = image.as_ref().map(|_| "image/jpeg".to_string());
    let image_size = image.as_ref().map(|b| b.len() as u64);
    ProductRecord {
        id,
        name: format!("Product {id}"),
        description: None,
        image,
        image_mime_type,
        image_size,
        category_id: 1,
        user_id: 1,
        purchase_price: price("10.00"),
        sale_price: price("12.50"),
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

/// Ids of the rows inserted by [`seeded_db`].
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub user_id: u64,
    pub category_id: u64,
}

/// Database holding one user and one category named "Furniture".
///
/// The user row carries a placeholder hash; tests that need to log in go
/// through `auth::register` instead.
pub fn seeded_db() -> (Database, Seed) {
    let mut db = Database::empty();
    let user_id = db.next_id(Table::Users);
    db.users.insert(
        user_id,
        UserRecord {
            id: user_id,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "unused".to_string(),
            created_at: fixed_now(),
            updated_at: fixed_now(),
        },
    );
    let category_id = db.next_id(Table::Categories);
    db.categories.insert(
        category_id,
        CategoryRecord {
            id: category_id,
            name: "Furniture".to_string(),
            created_at: fixed_now(),
            updated_at: fixed_now(),
        },
    );
    let seed = Seed {
        user_id,
        category_id,
    };
    (db, seed)
}
