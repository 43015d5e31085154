//! Product and category operations over the record store.
//!
//! Writes follow one rule: validate and encode everything first, touch the
//! [`Database`] last. A rejected image, a missing field or a dangling
//! foreign key leaves every table exactly as it was, so a product row never
//! holds a partial image triple.
//!
//! Reads go through [`ProductView`], which swaps the raw image columns for
//! [`display_product_image`] output.

use crate::db::{CategoryRecord, Database, ProductRecord, Table};
use crate::imaging::{ImageBackend, ImageError, display_product_image, encode_product_image};
use crate::types::{ImageDisplay, Price, ProductImage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Longest accepted product or category name.
const MAX_NAME_LEN: usize = 255;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    InvalidImage(#[from] ImageError),
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("invalid {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("storage constraint violation: {0}")]
    StorageConstraintViolation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("stored {entity} {id} is corrupt: {message}")]
    CorruptRecord {
        entity: &'static str,
        id: u64,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Create-product form. Required fields are `Option` so that absence is
/// reported as [`CatalogError::MissingRequiredField`] instead of being
/// unrepresentable.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<u64>,
    pub purchase_price: Option<Price>,
    pub sale_price: Option<Price>,
    /// Raw upload bytes, never stored as-is.
    pub image: Option<Vec<u8>>,
}

/// What an update does to the stored image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageUpdate {
    #[default]
    Keep,
    /// Encode these raw bytes and replace all three image columns.
    Replace(Vec<u8>),
    /// Null all three image columns.
    Remove,
}

/// Update-product form. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub category_id: Option<u64>,
    pub purchase_price: Option<Price>,
    pub sale_price: Option<Price>,
    pub image: ImageUpdate,
}

/// Listing filters; all set filters must match.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<u64>,
    pub user_id: Option<u64>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

/// A product as returned by read operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    /// Data URI, or `null` when the product has no image.
    pub image: ImageDisplay,
    pub image_mime_type: Option<String>,
    pub image_size: Option<u64>,
    pub category_id: u64,
    pub category_name: Option<String>,
    pub user_id: u64,
    pub purchase_price: Price,
    pub sale_price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub product_count: usize,
}

fn validate_name(field: &'static str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::MissingRequiredField(field));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CatalogError::InvalidField {
            field,
            message: "must be at most 255 characters".into(),
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn not_found(entity: &'static str, id: u64) -> CatalogError {
    CatalogError::NotFound { entity, id }
}

fn require_category(db: &Database, category_id: u64) -> Result<()> {
    if db.categories.contains_key(&category_id) {
        return Ok(());
    }
    let message = format!("category_id {category_id} does not reference an existing category");
    Err(CatalogError::StorageConstraintViolation(message))
}

fn require_user(db: &Database, user_id: u64) -> Result<()> {
    if db.users.contains_key(&user_id) {
        return Ok(());
    }
    let message = format!("user_id {user_id} does not reference an existing user");
    Err(CatalogError::StorageConstraintViolation(message))
}

/// Encode an upload, logging the rejection before it propagates.
fn encode_upload(backend: &impl ImageBackend, bytes: Option<&[u8]>) -> Result<ProductImage> {
    match encode_product_image(backend, bytes) {
        Ok(image) => Ok(image),
        Err(e) => {
            warn!(error = %e, "product image rejected");
            Err(e.into())
        }
    }
}

/// Build the read representation of a stored row.
pub fn view(db: &Database, record: &ProductRecord) -> Result<ProductView> {
    let image = match record.image() {
        Ok(image) => image,
        Err(e) => {
            return Err(CatalogError::CorruptRecord {
                entity: "product",
                id: record.id,
                message: e.to_string(),
            });
        }
    };
    let category = db.categories.get(&record.category_id);
    Ok(ProductView {
        id: record.id,
        name: record.name.clone(),
        description: record.description.clone(),
        image: display_product_image(&image),
        image_mime_type: record.image_mime_type.clone(),
        image_size: record.image_size,
        category_id: record.category_id,
        category_name: category.map(|c| c.name.clone()),
        user_id: record.user_id,
        purchase_price: record.purchase_price,
        sale_price: record.sale_price,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// Create a product owned by `owner_id`.
#[instrument(skip(db, backend, input))]
pub fn create_product(
    db: &mut Database,
    backend: &impl ImageBackend,
    owner_id: u64,
    input: NewProduct,
    now: DateTime<Utc>,
) -> Result<ProductView> {
    let name = validate_name("name", input.name.as_deref().unwrap_or_default())?;
    let category_id = input
        .category_id
        .ok_or(CatalogError::MissingRequiredField("category_id"))?;
    let purchase_price = input
        .purchase_price
        .ok_or(CatalogError::MissingRequiredField("purchase_price"))?;
    let sale_price = input
        .sale_price
        .ok_or(CatalogError::MissingRequiredField("sale_price"))?;
    require_category(db, category_id)?;
    require_user(db, owner_id)?;

    let image = encode_upload(backend, input.image.as_deref())?;

    let id = db.next_id(Table::Products);
    let mut record = ProductRecord {
        id,
        name,
        description: normalize_description(input.description),
        image: None,
        image_mime_type: None,
        image_size: None,
        category_id,
        user_id: owner_id,
        purchase_price,
        sale_price,
        created_at: now,
        updated_at: now,
    };
    record.set_image(image);
    let view = view(db, &record)?;
    db.products.insert(id, record);
    info!(product_id = id, image_size = ?view.image_size, "product created");
    Ok(view)
}

/// Apply `update` to product `id`.
#[instrument(skip(db, backend, update))]
pub fn update_product(
    db: &mut Database,
    backend: &impl ImageBackend,
    id: u64,
    update: ProductUpdate,
    now: DateTime<Utc>,
) -> Result<ProductView> {
    let mut record = db
        .products
        .get(&id)
        .cloned()
        .ok_or(not_found("product", id))?;
    let name = update
        .name
        .as_deref()
        .map(|n| validate_name("name", n))
        .transpose()?;
    if let Some(category_id) = update.category_id {
        require_category(db, category_id)?;
    }
    let image = match update.image {
        ImageUpdate::Keep => None,
        ImageUpdate::Remove => Some(ProductImage::none()),
        ImageUpdate::Replace(bytes) => Some(encode_upload(backend, Some(&bytes))?),
    };

    if let Some(name) = name {
        record.name = name;
    }
    if let Some(description) = update.description {
        record.description = normalize_description(description);
    }
    if let Some(category_id) = update.category_id {
        record.category_id = category_id;
    }
    if let Some(price) = update.purchase_price {
        record.purchase_price = price;
    }
    if let Some(price) = update.sale_price {
        record.sale_price = price;
    }
    if let Some(image) = image {
        record.set_image(image);
    }
    record.updated_at = now;

    let view = view(db, &record)?;
    db.products.insert(id, record);
    info!(product_id = id, "product updated");
    Ok(view)
}

/// Fetch one product for display.
pub fn get_product(db: &Database, id: u64) -> Result<ProductView> {
    let record = db.products.get(&id).ok_or(not_found("product", id))?;
    view(db, record)
}

fn matches_filter(p: &ProductRecord, filter: &ProductFilter, needle: Option<&str>) -> bool {
    filter.category_id.is_none_or(|c| p.category_id == c)
        && filter.user_id.is_none_or(|u| p.user_id == u)
        && needle.is_none_or(|n| p.name.to_lowercase().contains(n))
}

/// List products matching `filter`, newest first.
pub fn list_products(db: &Database, filter: &ProductFilter) -> Result<Vec<ProductView>> {
    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    db.products
        .values()
        .rev()
        .filter(|p| matches_filter(p, filter, needle.as_deref()))
        .map(|p| view(db, p))
        .collect()
}

/// Hard-delete a product.
#[instrument(skip(db))]
pub fn delete_product(db: &mut Database, id: u64) -> Result<()> {
    db.products.remove(&id).ok_or(not_found("product", id))?;
    info!(product_id = id, "product deleted");
    Ok(())
}

// =============================================================================
// Categories
// =============================================================================

fn products_in(db: &Database, category_id: u64) -> usize {
    db.products
        .values()
        .filter(|p| p.category_id == category_id)
        .count()
}

fn category_name_taken(db: &Database, name: &str) -> bool {
    let wanted = name.to_lowercase();
    db.categories
        .values()
        .any(|c| c.name.to_lowercase() == wanted)
}

fn category_view(db: &Database, record: &CategoryRecord) -> Category {
    Category {
        id: record.id,
        name: record.name.clone(),
        product_count: products_in(db, record.id),
    }
}

/// Add a category. Names are unique, compared case-insensitively.
#[instrument(skip(db))]
pub fn add_category(db: &mut Database, name: &str, now: DateTime<Utc>) -> Result<Category> {
    let name = validate_name("name", name)?;
    if category_name_taken(db, &name) {
        let message = format!("category name {name:?} is already taken");
        return Err(CatalogError::StorageConstraintViolation(message));
    }
    let id = db.next_id(Table::Categories);
    let record = CategoryRecord {
        id,
        name,
        created_at: now,
        updated_at: now,
    };
    let category = category_view(db, &record);
    db.categories.insert(id, record);
    info!(category_id = id, "category added");
    Ok(category)
}

/// All categories ordered by name.
pub fn list_categories(db: &Database) -> Vec<Category> {
    let mut categories: Vec<Category> = db
        .categories
        .values()
        .map(|record| category_view(db, record))
        .collect();
    categories.sort_by_key(|c| c.name.to_lowercase());
    categories
}

/// Delete a category that no product references.
#[instrument(skip(db))]
pub fn delete_category(db: &mut Database, id: u64) -> Result<()> {
    if !db.categories.contains_key(&id) {
        return Err(not_found("category", id));
    }
    let referenced = products_in(db, id);
    if referenced > 0 {
        let message = format!("category {id} is referenced by {referenced} product(s)");
        return Err(CatalogError::StorageConstraintViolation(message));
    }
    db.categories.remove(&id);
    info!(category_id = id, "category deleted");
    Ok(())
}
