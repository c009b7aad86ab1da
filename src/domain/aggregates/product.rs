//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Money, Quantity};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) price: Money,
    pub(crate) stock: Quantity,
    pub(crate) image: Option<String>,
    pub(crate) folder_name: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Admin edit. Absent or blank fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<Quantity>,
}

impl Product {
    pub fn create(name: impl Into<String>, description: impl Into<String>, price: Money, stock: Quantity) -> Result<Self, ProductError> {
        let name = name.into().trim().to_string();
        let description = description.into().trim().to_string();
        if name.is_empty() { return Err(ProductError::MissingName); }
        if description.is_empty() { return Err(ProductError::MissingDescription); }
        if !price.is_positive() { return Err(ProductError::InvalidPrice); }
        let now = Utc::now();
        let id = Uuid::now_v7();
        Ok(Self {
            id, folder_name: image_folder(&name, id), name, description, price, stock,
            image: None, created_at: now, updated_at: now,
        })
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> &Money { &self.price }
    pub fn stock(&self) -> Quantity { self.stock }
    pub fn image(&self) -> Option<&str> { self.image.as_deref() }
    pub fn folder_name(&self) -> &str { &self.folder_name }
    pub fn has_stock_for(&self, qty: u32) -> bool { self.stock.covers(qty) }

    pub fn apply(&mut self, update: ProductUpdate) -> Result<(), ProductError> {
        if let Some(name) = non_blank(update.name) { self.name = name; }
        if let Some(description) = non_blank(update.description) { self.description = description; }
        if let Some(price) = update.price {
            if !price.is_positive() { return Err(ProductError::InvalidPrice); }
            self.price = price;
        }
        if let Some(stock) = update.stock { self.stock = stock; }
        self.touch();
        Ok(())
    }

    /// Points the product at `main.<ext>` inside the folder derived from its current name.
    pub fn attach_image(&mut self, extension: &str) -> &str {
        self.folder_name = image_folder(&self.name, self.id);
        self.image = Some(format!("/assets/products/{}/main.{}", self.folder_name, extension));
        self.touch();
        self.image.as_deref().unwrap_or_default()
    }

    pub fn decrement_stock(&mut self, qty: u32) {
        self.stock = self.stock.saturating_sub(qty);
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Directory-safe slug of a product name.
pub fn folder_name_for(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_dash = !slug.is_empty();
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            if pending_dash { slug.push('-'); pending_dash = false; }
            slug.push(ch);
        }
    }
    if slug.is_empty() { "product".to_string() } else { slug }
}

/// Slug of the name plus the random tail of the id, so equal slugs never share a folder.
fn image_folder(name: &str, id: Uuid) -> String {
    let id = id.simple().to_string();
    format!("{}-{}", folder_name_for(name), &id[id.len() - 8..])
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingName, MissingDescription, InvalidPrice }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Missing name"),
            Self::MissingDescription => write!(f, "Missing description"),
            Self::InvalidPrice => write!(f, "Price must be greater than zero"),
        }
    }
}
