//! Filter state, pagination, and URL query-string synchronization.
//!
//! [`FilterState`] is the session-scoped view state behind the product list:
//! the text/price/rating filter plus the current page. It synchronizes both
//! ways with the address bar - reconstructed from query parameters on load,
//! and serialized back to exactly the non-default parameters after every
//! change so the URL stays minimal and bookmarkable.

use thiserror::Error;
use url::form_urlencoded;

/// Query parameter names, as they appear in the address bar.
mod params {
    pub const SEARCH: &str = "search";
    pub const MIN_PRICE: &str = "minPrice";
    pub const MAX_PRICE: &str = "maxPrice";
    pub const RATING: &str = "rating";
    pub const PAGE: &str = "page";
}

/// Page size when none is configured.
pub const DEFAULT_LIMIT: u32 = 10;

/// Errors raised on paginator misuse.
///
/// These are the only errors the pure side of the catalogue surfaces;
/// navigation controls are expected to disable at boundaries rather than
/// probe for them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Requested page outside `1..=max`.
    #[error("page {page} is out of range (valid: 1..={max})")]
    PageOutOfRange {
        /// The requested page.
        page: u32,
        /// The highest valid page for the current result set.
        max: u32,
    },
    /// A page size of zero can never produce a page.
    #[error("limit must be greater than zero")]
    ZeroLimit,
}

/// The product-list view state: filter fields plus pagination.
///
/// Mutating any filter field resets `page` to 1, since changing the filter
/// invalidates the current page position; `set_page` is the only operation
/// that leaves the rest of the state alone.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    query: String,
    min_price: String,
    max_price: String,
    rating: Option<f64>,
    page: u32,
    limit: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            min_price: String::new(),
            max_price: String::new(),
            rating: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FilterState {
    /// A default state with a custom page size.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::ZeroLimit`] when `limit` is zero.
    pub fn with_limit(limit: u32) -> Result<Self, FilterError> {
        if limit == 0 {
            return Err(FilterError::ZeroLimit);
        }
        Ok(Self {
            limit,
            ..Self::default()
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn min_price(&self) -> &str {
        &self.min_price
    }

    #[must_use]
    pub fn max_price(&self) -> &str {
        &self.max_price
    }

    #[must_use]
    pub const fn rating(&self) -> Option<f64> {
        self.rating
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Set the text query; resets the page.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    /// Set the minimum price bound; resets the page.
    pub fn set_min_price(&mut self, min_price: impl Into<String>) {
        self.min_price = min_price.into();
        self.page = 1;
    }

    /// Set the maximum price bound; resets the page.
    pub fn set_max_price(&mut self, max_price: impl Into<String>) {
        self.max_price = max_price.into();
        self.page = 1;
    }

    /// Set the rating threshold; resets the page.
    pub fn set_rating(&mut self, rating: Option<f64>) {
        self.rating = rating;
        self.page = 1;
    }

    /// Navigate to a page without touching the filter fields.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::PageOutOfRange`] for page 0. The upper bound
    /// depends on the filtered result set and is enforced by
    /// [`Self::page_slice`].
    pub fn set_page(&mut self, page: u32) -> Result<(), FilterError> {
        if page == 0 {
            return Err(FilterError::PageOutOfRange { page, max: 1 });
        }
        self.page = page;
        Ok(())
    }

    /// Reset every filter field and the page to defaults; the page size is
    /// kept.
    pub fn reset(&mut self) {
        let limit = self.limit;
        *self = Self {
            limit,
            ..Self::default()
        };
    }

    // =========================================================================
    // URL synchronization
    // =========================================================================

    /// Reconstruct the state from a URL query string (URL → state).
    ///
    /// Absent or malformed parameters fall back to defaults, so any address
    /// bar content yields a usable state.
    #[must_use]
    pub fn from_query_str(query: &str) -> Self {
        Self::from_query_str_with_limit(query, DEFAULT_LIMIT)
    }

    /// [`Self::from_query_str`] with a custom page size.
    #[must_use]
    pub fn from_query_str_with_limit(query: &str, limit: u32) -> Self {
        let mut state = Self {
            limit: limit.max(1),
            ..Self::default()
        };

        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                params::SEARCH => state.query = value.into_owned(),
                params::MIN_PRICE => state.min_price = value.into_owned(),
                params::MAX_PRICE => state.max_price = value.into_owned(),
                params::RATING => state.rating = value.parse().ok(),
                params::PAGE => {
                    state.page = value.parse().ok().filter(|&p| p >= 1).unwrap_or(1);
                }
                _ => {}
            }
        }

        state
    }

    /// Serialize the state to a URL query string (state → URL).
    ///
    /// Contains exactly the non-default fields: an empty query, empty price
    /// bounds, an unset rating, and page 1 are all omitted. A fully-default
    /// state serializes to an empty string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        if !self.query.is_empty() {
            serializer.append_pair(params::SEARCH, &self.query);
        }
        if !self.min_price.is_empty() {
            serializer.append_pair(params::MIN_PRICE, &self.min_price);
        }
        if !self.max_price.is_empty() {
            serializer.append_pair(params::MAX_PRICE, &self.max_price);
        }
        if let Some(rating) = self.rating {
            serializer.append_pair(params::RATING, &rating.to_string());
        }
        if self.page > 1 {
            serializer.append_pair(params::PAGE, &self.page.to_string());
        }

        serializer.finish()
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Number of pages the filtered result set spans.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn total_pages(&self, filtered_count: usize) -> u32 {
        let limit = self.limit as usize;
        filtered_count.div_ceil(limit) as u32
    }

    /// The current page's slice of a filtered result set.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::PageOutOfRange`] when the current page exceeds
    /// the result set. Page 1 is always valid, including for an empty result
    /// set.
    pub fn page_slice<'a, T>(&self, items: &'a [T]) -> Result<&'a [T], FilterError> {
        let max = self.total_pages(items.len()).max(1);
        if self.page > max {
            return Err(FilterError::PageOutOfRange {
                page: self.page,
                max,
            });
        }

        let start = ((self.page - 1) * self.limit) as usize;
        let end = (start + self.limit as usize).min(items.len());
        Ok(items.get(start..end).unwrap_or(&[]))
    }
}
