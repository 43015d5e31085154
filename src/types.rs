//! Value types shared by the codec, the record store and the CLI.
//!
//! [`ProductImage`] is the stored-image triple, [`ImageDisplay`] its
//! read-side rendering, and [`Price`] the fixed-point money type used for
//! both product price columns.

use crate::imaging::{ImageError, OUTPUT_MIME_TYPE};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Re-encoded image bytes together with their metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    bytes: Vec<u8>,
    mime_type: String,
}

impl StoredImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The image triple stored on a product: `(encoded_bytes, mime_type, byte_size)`.
///
/// The three parts are either all present or all absent; the type has no
/// way to express anything in between. `byte_size` is always derived from
/// the bytes, so it cannot drift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductImage(Option<StoredImage>);

impl ProductImage {
    /// The all-null triple.
    pub fn none() -> Self {
        Self(None)
    }

    /// A triple holding freshly encoded output-format bytes.
    pub(crate) fn encoded(bytes: Vec<u8>) -> Self {
        Self(Some(StoredImage {
            bytes,
            mime_type: OUTPUT_MIME_TYPE.to_string(),
        }))
    }

    /// Rebuild a triple from its three stored columns.
    ///
    /// Rejects rows where only some columns are set, where the size column
    /// disagrees with the blob length, or where the blob is empty.
    pub fn from_columns(
        bytes: Option<Vec<u8>>,
        mime_type: Option<String>,
        byte_size: Option<u64>,
    ) -> Result<Self, ImageError> {
        match (bytes, mime_type, byte_size) {
            (None, None, None) => Ok(Self::none()),
            (Some(bytes), Some(mime_type), Some(size)) => {
                if bytes.is_empty() {
                    return Err(ImageError::InconsistentColumns("empty image blob".into()));
                }
                if bytes.len() as u64 != size {
                    let held = bytes.len();
                    let message = format!("image_size is {size} but blob holds {held} bytes");
                    return Err(ImageError::InconsistentColumns(message));
                }
                Ok(Self(Some(StoredImage { bytes, mime_type })))
            }
            (bytes, mime_type, size) => {
                let message = format!(
                    "partial triple (image: {}, image_mime_type: {}, image_size: {})",
                    presence(bytes.is_some()),
                    presence(mime_type.is_some()),
                    presence(size.is_some()),
                );
                Err(ImageError::InconsistentColumns(message))
            }
        }
    }

    /// Split into the three column values.
    pub fn into_columns(self) -> (Option<Vec<u8>>, Option<String>, Option<u64>) {
        match self.0 {
            Some(stored) => {
                let size = stored.byte_size();
                (Some(stored.bytes), Some(stored.mime_type), Some(size))
            }
            None => (None, None, None),
        }
    }

    pub fn stored(&self) -> Option<&StoredImage> {
        self.0.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn encoded_bytes(&self) -> Option<&[u8]> {
        self.0.as_ref().map(StoredImage::bytes)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.0.as_ref().map(StoredImage::mime_type)
    }

    pub fn byte_size(&self) -> Option<u64> {
        self.0.as_ref().map(StoredImage::byte_size)
    }
}

fn presence(set: bool) -> &'static str {
    if set { "set" } else { "null" }
}

/// Read-side rendering of a [`ProductImage`].
///
/// Serializes as the data-URI string, or as `null` for [`ImageDisplay::NoImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDisplay {
    DataUri(String),
    NoImage,
}

impl ImageDisplay {
    pub fn as_data_uri(&self) -> Option<&str> {
        match self {
            Self::DataUri(uri) => Some(uri),
            Self::NoImage => None,
        }
    }
}

impl Serialize for ImageDisplay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::DataUri(uri) => serializer.serialize_str(uri),
            Self::NoImage => serializer.serialize_none(),
        }
    }
}

// =============================================================================
// Price
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price is not a decimal number: {0}")]
    Invalid(String),
    #[error("price must not be negative")]
    Negative,
    #[error("price exceeds the maximum of 99999999.99")]
    TooLarge,
}

/// A non-negative amount with exactly two fractional digits, fitting a
/// `DECIMAL(10, 2)` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Largest storable amount.
    pub fn max() -> Decimal {
        Decimal::new(9_999_999_999, 2)
    }

    /// Validate and normalize an amount. Extra fractional digits are rounded
    /// half away from zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded > Self::max() {
            return Err(PriceError::TooLarge);
        }
        rounded.rescale(2);
        Ok(Self(rounded))
    }

    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = match Decimal::from_str(s.trim()) {
            Ok(amount) => amount,
            Err(_) => return Err(PriceError::Invalid(s.to_string())),
        };
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
