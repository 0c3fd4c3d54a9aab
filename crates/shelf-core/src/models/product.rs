//! Catalog product models

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A product record as served by the remote catalog.
///
/// Items are immutable once received and are replaced wholesale by the next
/// fetch. `name` is the de-duplication key (exact, case-sensitive match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Product name, unique within a sync cycle
    #[serde(rename = "product_name")]
    pub name: String,
    /// Product type shown as a filter chip
    #[serde(rename = "product_type")]
    pub category: String,
    /// Unit price
    pub price: f64,
    /// Tax rate in percent (0-100)
    #[serde(rename = "tax")]
    pub tax_rate: f64,
    /// Optional image URL
    #[serde(rename = "image", default)]
    pub image_ref: Option<String>,
}

impl CatalogItem {
    /// Create a catalog item without an image
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        tax_rate: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price,
            tax_rate,
            image_ref: None,
        }
    }

    /// Attach an image reference
    #[must_use]
    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// A locally created product waiting to be submitted to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPayload {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub tax_rate: f64,
    /// JPEG bytes, sent as the `image` multipart part
    pub image: Option<Vec<u8>>,
}

impl ProductPayload {
    /// Build a payload, trimming text fields and validating numbers.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        tax_rate: f64,
    ) -> Result<Self> {
        let payload = Self {
            name: name.into().trim().to_string(),
            category: category.into().trim().to_string(),
            price,
            tax_rate,
            image: None,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Attach JPEG image bytes
    #[must_use]
    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }

    /// Check the invariants the catalog service expects.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("product name cannot be empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidInput("product type cannot be empty".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidInput(format!(
                "price must be a non-negative number, got {}",
                self.price
            )));
        }
        if !self.tax_rate.is_finite() || !(0.0..=100.0).contains(&self.tax_rate) {
            return Err(Error::InvalidInput(format!(
                "tax rate must be between 0 and 100, got {}",
                self.tax_rate
            )));
        }
        Ok(())
    }

    /// The catalog entry this payload becomes once accepted (no image URL yet).
    #[must_use]
    pub fn to_catalog_item(&self) -> CatalogItem {
        CatalogItem::new(&self.name, &self.category, self.price, self.tax_rate)
    }
}
