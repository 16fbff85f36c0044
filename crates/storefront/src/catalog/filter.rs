//! Pure catalogue filtering.
//!
//! The predicate is a logical AND of four independently-optional
//! sub-predicates (text, min price, max price, rating). Input order is
//! preserved and nothing here touches I/O, so filtering is unit-testable
//! without network state.

use tidepool_core::Product;

use super::pagination::FilterState;

/// Narrow a product list by the active filter.
///
/// - text: case-insensitive substring match of the query against the title;
///   an empty query matches everything
/// - min/max price: inclusive bounds, active only when the bound is a
///   non-empty numeric string (an unparseable bound is ignored)
/// - rating: `rating >= threshold`; a product without a rating compares as 0
#[must_use]
pub fn filter_products(products: &[Product], filter: &FilterState) -> Vec<Product> {
    let query = filter.query().to_lowercase();
    let min_price = parse_bound(filter.min_price());
    let max_price = parse_bound(filter.max_price());
    let rating = filter.rating();

    products
        .iter()
        .filter(|product| {
            let matches_query = query.is_empty() || product.title.to_lowercase().contains(&query);
            let matches_min = min_price.is_none_or(|min| product.price >= min);
            let matches_max = max_price.is_none_or(|max| product.price <= max);
            let matches_rating = rating.is_none_or(|r| product.effective_rating() >= r);

            matches_query && matches_min && matches_max && matches_rating
        })
        .cloned()
        .collect()
}

/// A price bound is active only when non-empty and numeric.
fn parse_bound(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}
