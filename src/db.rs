//! Record store: every table of the catalog in one JSON data file.
//!
//! The data file is a versioned snapshot of four tables — users, sessions,
//! categories and products — loaded at the start of a command and written
//! back after a successful mutation. Rows are plain column structs; the
//! typed views ([`ProductImage`](crate::types::ProductImage), the public
//! [`User`](crate::auth::User)) are built from them by the owning modules.
//!
//! ## Storage
//!
//! - Product images keep the three-column layout (`image`,
//!   `image_mime_type`, `image_size`). The blob column is base64 inside the
//!   JSON document.
//! - Saves go to a sibling temp file that is then renamed over the data
//!   file, so an interrupted save never leaves a half-written snapshot.
//! - A missing file loads as an empty database. A file with an unknown
//!   `version` is an error rather than being silently discarded.

use crate::imaging::ImageError;
use crate::types::{Price, ProductImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the data file format.
const DATA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported data file version {found}")]
    UnsupportedVersion { found: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    /// Stored lowercased; unique.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: u64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "blob")]
    pub image: Option<Vec<u8>>,
    #[serde(default)]
    pub image_mime_type: Option<String>,
    #[serde(default)]
    pub image_size: Option<u64>,
    pub category_id: u64,
    pub user_id: u64,
    pub purchase_price: Price,
    pub sale_price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Rebuild the image triple from the three image columns.
    pub fn image(&self) -> Result<ProductImage, ImageError> {
        ProductImage::from_columns(
            self.image.clone(),
            self.image_mime_type.clone(),
            self.image_size,
        )
    }

    /// Overwrite all three image columns at once.
    pub fn set_image(&mut self, image: ProductImage) {
        let (bytes, mime_type, size) = image.into_columns();
        self.image = bytes;
        self.image_mime_type = mime_type;
        self.image_size = size;
    }
}

/// The whole catalog: one snapshot of every table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub version: u32,
    #[serde(default)]
    pub users: BTreeMap<u64, UserRecord>,
    /// Keyed by the SHA-256 hex digest of the bearer token.
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionRecord>,
    #[serde(default)]
    pub categories: BTreeMap<u64, CategoryRecord>,
    #[serde(default)]
    pub products: BTreeMap<u64, ProductRecord>,
    #[serde(default)]
    next_ids: NextIds,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct NextIds {
    user: u64,
    category: u64,
    product: u64,
}

/// Table selector for id allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Categories,
    Products,
}

impl Default for Database {
    fn default() -> Self {
        Self::empty()
    }
}

impl Database {
    pub fn empty() -> Self {
        Self {
            version: DATA_VERSION,
            users: BTreeMap::new(),
            sessions: BTreeMap::new(),
            categories: BTreeMap::new(),
            products: BTreeMap::new(),
            next_ids: NextIds::default(),
        }
    }

    /// Load the data file. A missing file is an empty database.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => return Err(e.into()),
        };
        let db: Self = serde_json::from_str(&content)?;
        if db.version != DATA_VERSION {
            return Err(DbError::UnsupportedVersion { found: db.version });
        }
        Ok(db)
    }

    /// Write the snapshot via a temp file + rename.
    pub fn save(&self, path: &Path) -> Result<(), DbError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Allocate the next id for `table`. Ids start at 1 and are never reused.
    pub fn next_id(&mut self, table: Table) -> u64 {
        let (counter, existing_max) = match table {
            Table::Users => (&mut self.next_ids.user, self.users.keys().last()),
            Table::Categories => (&mut self.next_ids.category, self.categories.keys().last()),
            Table::Products => (&mut self.next_ids.product, self.products.keys().last()),
        };
        let next = (*counter).max(existing_max.copied().unwrap_or(0)) + 1;
        *counter = next;
        next
    }

    pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.values().find(|u| u.email == email)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serde adapter storing an optional blob as a base64 string.
mod blob {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
