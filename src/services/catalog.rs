//! Product catalogue administration and image storage.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::aggregates::{Product, ProductUpdate};
use crate::domain::value_objects::{Money, Quantity};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Largest accepted product image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

/// An uploaded file from the product form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Lower-cased file extension, if this is an acceptable image.
    pub fn extension(&self) -> Result<String> {
        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()));
        let mime_ok = self
            .content_type
            .as_deref()
            .map_or(true, |ct| IMAGE_EXTENSIONS.iter().any(|allowed| ct.to_ascii_lowercase().contains(allowed)));

        match ext {
            Some(ext) if mime_ok => {
                if self.bytes.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::bad_request("Image must be 5 MB or smaller"));
                }
                Ok(ext)
            }
            _ => Err(AppError::bad_request("Only image files are allowed")),
        }
    }
}

/// Product form fields as submitted. Blank strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Product images on disk, laid out as `<root>/products/<folder>/main.<ext>`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory served under `/assets`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder(&self, folder_name: &str) -> PathBuf {
        self.root.join("products").join(folder_name)
    }

    /// Write `main.<ext>`, replacing any earlier main image in the folder.
    pub async fn save(&self, folder_name: &str, ext: &str, bytes: &[u8]) -> std::io::Result<()> {
        let dir = self.folder(folder_name);
        tokio::fs::create_dir_all(&dir).await?;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().is_some_and(|stem| stem == "main") {
                tokio::fs::remove_file(&path).await?;
            }
        }
        tokio::fs::write(dir.join(format!("main.{ext}")), bytes).await
    }

    /// Remove a product's image folder. A missing folder is not an error.
    pub async fn remove(&self, folder_name: &str) -> std::io::Result<()> {
        match tokio::fs::remove_dir_all(self.folder(folder_name)).await {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

pub async fn create_product(state: &AppState, form: ProductForm) -> Result<Product> {
    let (Some(name), Some(description), Some(price), Some(stock)) =
        (present(form.name), present(form.description), present(form.price), present(form.stock))
    else {
        return Err(AppError::bad_request("All fields are required"));
    };
    let image = form.image.map(|upload| upload.extension().map(|ext| (ext, upload))).transpose()?;

    let mut product = Product::create(name, description, parse_price(&price)?, parse_stock(&stock)?)?;
    if let Some((ext, upload)) = image {
        product.attach_image(&ext);
        store_image(state, product.folder_name(), &ext, &upload.bytes).await?;
    }

    state.repos.products.insert(&product).await?;
    tracing::info!(product_id = %product.id(), name = product.name(), "Product created");
    Ok(product)
}

pub async fn update_product(state: &AppState, id: Uuid, form: ProductForm) -> Result<Product> {
    let mut product = state.repos.products.find(id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    let image = form.image.map(|upload| upload.extension().map(|ext| (ext, upload))).transpose()?;

    let update = ProductUpdate {
        name: form.name,
        description: form.description,
        price: present(form.price).map(|p| parse_price(&p)).transpose()?,
        stock: present(form.stock).map(|s| parse_stock(&s)).transpose()?,
    };
    product.apply(update)?;

    if let Some((ext, upload)) = image {
        let previous_folder = product.folder_name().to_string();
        product.attach_image(&ext);
        store_image(state, product.folder_name(), &ext, &upload.bytes).await?;
        if previous_folder != product.folder_name() {
            if let Err(e) = state.images.remove(&previous_folder).await {
                tracing::warn!(error = %e, folder = %previous_folder, "Failed to remove old image folder");
            }
        }
    }

    state.repos.products.update(&product).await?;
    tracing::info!(product_id = %product.id(), "Product updated");
    Ok(product)
}

pub async fn delete_product(state: &AppState, id: Uuid) -> Result<()> {
    let product = state.repos.products.find(id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    if let Err(e) = state.images.remove(product.folder_name()).await {
        tracing::warn!(error = %e, folder = product.folder_name(), "Failed to remove product images");
    }
    if !state.repos.products.delete(id).await? {
        return Err(AppError::not_found("Product"));
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}

async fn store_image(state: &AppState, folder: &str, ext: &str, bytes: &[u8]) -> Result<()> {
    state
        .images
        .save(folder, ext, bytes)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store product image: {e}")))
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Whole rupiah only; the currency has no minor unit.
fn parse_price(raw: &str) -> Result<Money> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|d| d.is_sign_positive() && !d.is_zero() && d.fract().is_zero())
        .map(|d| Money::idr(d.trunc()))
        .ok_or_else(|| AppError::bad_request("Invalid price"))
}

fn parse_stock(raw: &str) -> Result<Quantity> {
    raw.trim().parse::<u32>().map(Quantity::new).map_err(|_| AppError::bad_request("Invalid stock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: Option<&str>, len: usize) -> ImageUpload {
        ImageUpload { file_name: name.into(), content_type: content_type.map(Into::into), bytes: vec![0; len] }
    }

    #[test]
    fn test_image_extension_rules() {
        assert_eq!(upload("Front.JPG", Some("image/jpeg"), 10).extension().unwrap(), "jpg");
        assert_eq!(upload("x.webp", None, 10).extension().unwrap(), "webp");
        assert!(upload("x.gif", Some("image/gif"), 10).extension().is_err());
        assert!(upload("x.png", Some("text/plain"), 10).extension().is_err());
        assert!(upload("noext", Some("image/png"), 10).extension().is_err());
        assert!(upload("big.png", Some("image/png"), MAX_IMAGE_BYTES + 1).extension().is_err());
    }

    #[test]
    fn test_price_and_stock_parsing() {
        assert_eq!(parse_price("45000").unwrap().amount(), Decimal::new(45_000, 0));
        assert_eq!(parse_price(" 45000.00 ").unwrap().amount(), Decimal::new(45_000, 0));
        assert!(parse_price("12.5").is_err());
        assert!(parse_price("0").is_err());
        assert!(parse_price("-1").is_err());
        assert!(parse_price("abc").is_err());
        assert_eq!(parse_stock("7").unwrap().value(), 7);
        assert!(parse_stock("-3").is_err());
    }

    #[tokio::test]
    async fn test_image_store_replaces_main_and_removes() {
        let root = std::env::temp_dir().join(format!("scentfix-images-{}", Uuid::new_v4()));
        let store = ImageStore::new(&root);
        store.save("classic", "png", b"one").await.unwrap();
        store.save("classic", "jpg", b"two").await.unwrap();

        let dir = root.join("products").join("classic");
        assert!(!dir.join("main.png").exists());
        assert_eq!(tokio::fs::read(dir.join("main.jpg")).await.unwrap(), b"two");

        store.remove("classic").await.unwrap();
        assert!(!dir.exists());
        store.remove("classic").await.unwrap();
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
