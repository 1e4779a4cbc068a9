//! List filters
//!
//! `FilterState` is the in-memory form of the list view's filters. The URL
//! query string is its only durable form (see [`codec`]), and
//! [`location::UrlFilters`] keeps the two in step.

pub mod codec;
pub mod location;

use serde::{Deserialize, Serialize};

use crate::models::AdStatus;

pub use codec::{cache_key, decode, encode, to_api_query};
pub use location::{MemoryHistory, Navigator, UrlFilters};

/// Page used when the URL has none or an invalid one
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the URL has none or an invalid one
pub const DEFAULT_LIMIT: u32 = 10;

/// Sortable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    CreatedAt,
    Price,
    Priority,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Price => "price",
            Self::Priority => "priority",
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "price" => Ok(Self::Price),
            "priority" => Ok(Self::Priority),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

/// Combined sort choice as offered by the filter panel, e.g. `price_asc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOption {
    pub by: SortBy,
    pub order: SortOrder,
}

impl SortOption {
    /// Choices offered to the moderator, in menu order
    pub const CHOICES: [SortOption; 5] = [
        SortOption { by: SortBy::CreatedAt, order: SortOrder::Desc },
        SortOption { by: SortBy::CreatedAt, order: SortOrder::Asc },
        SortOption { by: SortBy::Price, order: SortOrder::Asc },
        SortOption { by: SortBy::Price, order: SortOrder::Desc },
        SortOption { by: SortBy::Priority, order: SortOrder::Desc },
    ];
}

impl Default for SortOption {
    /// Newest first, which is also what the server does without a sort
    fn default() -> Self {
        Self {
            by: SortBy::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.by.as_str(), self.order.as_str())
    }
}

impl std::str::FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (by, order) = s
            .split_once('_')
            .ok_or_else(|| format!("Invalid sort option: {}", s))?;
        Ok(Self {
            by: by.parse()?,
            order: order.parse()?,
        })
    }
}

/// Why a filter state was refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("limit must be at least 1")]
    InvalidLimit,
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },
    #[error("minPrice {min} is greater than maxPrice {max}")]
    InvertedPriceRange { min: f64, max: f64 },
}

/// Filters of the list view
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub page: u32,
    pub limit: u32,
    /// Status filter in selection order; empty means every status
    pub status: Vec<AdStatus>,
    pub category_id: Option<u32>,
    /// Free-text search; never `Some("")`
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            status: Vec::new(),
            category_id: None,
            search: None,
            min_price: None,
            max_price: None,
            sort_by: None,
            sort_order: None,
        }
    }
}

impl FilterState {
    /// Check the invariants the URL must never violate
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.page < 1 {
            return Err(FilterError::InvalidPage);
        }
        if self.limit < 1 {
            return Err(FilterError::InvalidLimit);
        }
        for (field, value) in [("minPrice", self.min_price), ("maxPrice", self.max_price)] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(FilterError::InvalidPrice { field, value });
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(FilterError::InvertedPriceRange { min, max });
            }
        }
        Ok(())
    }

    /// Same filters on another page
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Sort choice to display; absent fields fall back to newest first
    pub fn sort_option(&self) -> SortOption {
        let default = SortOption::default();
        SortOption {
            by: self.sort_by.unwrap_or(default.by),
            order: self.sort_order.unwrap_or(default.order),
        }
    }

    /// Whether the new-items check applies to these filters.
    ///
    /// Only the first page without search or category qualifies. A status
    /// filter or price range does not disqualify.
    pub fn watches_new_items(&self) -> bool {
        self.page == 1 && self.search.is_none() && self.category_id.is_none()
    }

    /// Apply one filter panel edit
    ///
    /// Every edit except `Page` sends the moderator back to page 1.
    pub fn apply(&self, edit: FilterEdit) -> Self {
        let mut next = self.clone();
        match edit {
            FilterEdit::Page(page) => {
                next.page = page;
                return next;
            }
            FilterEdit::Search(search) => {
                next.search = search.filter(|s| !s.is_empty());
            }
            FilterEdit::Statuses(statuses) => {
                next.status = dedup_statuses(statuses);
            }
            FilterEdit::Category(category_id) => next.category_id = category_id,
            FilterEdit::MinPrice(price) => next.min_price = price,
            FilterEdit::MaxPrice(price) => next.max_price = price,
            FilterEdit::Sort(option) => {
                next.sort_by = Some(option.by);
                next.sort_order = Some(option.order);
            }
            FilterEdit::Reset => {
                next = Self {
                    sort_by: Some(SortBy::CreatedAt),
                    sort_order: Some(SortOrder::Desc),
                    ..Self::default()
                };
            }
        }
        next.page = DEFAULT_PAGE;
        next
    }
}

/// A single change made in the filter panel
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEdit {
    Search(Option<String>),
    Statuses(Vec<AdStatus>),
    Category(Option<u32>),
    MinPrice(Option<f64>),
    MaxPrice(Option<f64>),
    Sort(SortOption),
    Page(u32),
    Reset,
}

/// Drop repeated statuses, keeping first occurrences in order
pub(crate) fn dedup_statuses(statuses: impl IntoIterator<Item = AdStatus>) -> Vec<AdStatus> {
    let mut out = Vec::new();
    for status in statuses {
        if !out.contains(&status) {
            out.push(status);
        }
    }
    out
}
