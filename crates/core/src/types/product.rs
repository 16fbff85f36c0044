//! The catalogue product document.
//!
//! Products come from a read-only external catalogue API and are never
//! written back, so this is a plain wire struct rather than a validated
//! domain type. Unknown fields in the remote document are ignored.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A product as served by the catalogue store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalogue id.
    pub id: ProductId,
    /// Display title; the text filter matches against this.
    pub title: String,
    /// Unit price in the store currency's standard unit.
    pub price: f64,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Category slug, if the catalogue assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Average review rating; absent ratings compare as 0 in the filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Units in stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Current discount, as a percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    /// Availability label (e.g. "In Stock", "Low Stock").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<String>,
}

impl Product {
    /// The rating used for threshold comparisons; products without a rating
    /// compare as 0.
    #[must_use]
    pub fn effective_rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_document() {
        let product: Product = serde_json::from_str(
            r#"{"id": 7, "title": "Driftwood Lamp", "price": 49.5}"#,
        )
        .unwrap();

        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.title, "Driftwood Lamp");
        assert!((product.price - 49.5).abs() < f64::EPSILON);
        assert!(product.description.is_empty());
        assert!(product.rating.is_none());
        assert!((product.effective_rating() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let product: Product = serde_json::from_str(
            r#"{
                "id": 1,
                "title": "Sea Glass Coasters",
                "price": 12.0,
                "rating": 4.3,
                "discountPercentage": 10.5,
                "availabilityStatus": "In Stock",
                "thumbnail": "https://cdn.example.com/1.webp",
                "sku": "SGC-001"
            }"#,
        )
        .unwrap();

        assert_eq!(product.rating, Some(4.3));
        assert_eq!(product.availability_status.as_deref(), Some("In Stock"));
    }

    #[test]
    fn test_serialize_camel_case() {
        let product = Product {
            id: ProductId::new(2),
            title: "Tide Chart".to_owned(),
            price: 5.0,
            description: String::new(),
            category: None,
            images: vec![],
            rating: None,
            stock: None,
            discount_percentage: Some(2.5),
            availability_status: None,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["discountPercentage"], 2.5);
        assert!(json.get("rating").is_none());
    }
}
