//! Catalogue access: remote client plus the pure filter/pagination layer.
//!
//! The catalogue store is read-only and treated as an external collaborator;
//! responses are cached in-process with a short TTL (the per-page-load memory
//! analogue) and never persisted. Filtering and pagination operate purely on
//! the in-memory product list, independent of the record store.

pub mod filter;
pub mod pagination;

pub use filter::filter_products;
pub use pagination::{DEFAULT_LIMIT, FilterError, FilterState};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};

use tidepool_core::{Product, ProductId};

use crate::config::CommerceConfig;
use crate::error::StoreError;

/// Cached catalogue responses.
#[derive(Clone)]
enum CacheValue {
    Products(Vec<Product>),
    Product(Box<Product>),
}

/// `GET /products` response document.
#[derive(Debug, Deserialize)]
struct ProductsDocument {
    #[serde(default)]
    products: Vec<Product>,
}

/// Client for the catalogue store.
///
/// Products are cached for 5 minutes.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalogue client.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.products_api_url.clone(),
                cache,
            }),
        }
    }

    /// Get the full product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogue request fails or the response does
    /// not parse.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, StoreError> {
        let cache_key = "products".to_owned();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response = self
            .inner
            .client
            .get(&self.inner.base_url)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "Catalogue returned non-success status");
            return Err(StoreError::NotFound("Failed to load products".to_owned()));
        }

        let document: ProductsDocument = response.json().await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(document.products.clone()))
            .await;

        Ok(document.products)
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: ProductId) -> Result<Product, StoreError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response = self
            .inner
            .client
            .get(format!("{}/{}", self.inner.base_url, product_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::NotFound(format!(
                "Product not found: {product_id}"
            )));
        }

        let product: Product = response.json().await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Invalidate all cached catalogue data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_products_document_tolerates_missing_list() {
        let document: ProductsDocument = serde_json::from_str("{}").unwrap();
        assert!(document.products.is_empty());
    }

    #[test]
    fn test_products_document_parses_list() {
        let document: ProductsDocument = serde_json::from_str(
            r#"{"products": [{"id": 1, "title": "Lighthouse Mug", "price": 15.5}], "total": 1}"#,
        )
        .unwrap();
        assert_eq!(document.products.len(), 1);
    }
}
