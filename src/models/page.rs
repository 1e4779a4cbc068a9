//! Paginated list response

use serde::{Deserialize, Serialize};

use super::Ad;

/// Pagination block of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub current_page: u32,
    pub total_pages: u32,
    /// Total number of items across all pages
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Build pagination for `total_items` split into pages of `items_per_page`
    pub fn new(current_page: u32, items_per_page: u32, total_items: u64) -> Self {
        let total_pages = if items_per_page == 0 {
            0
        } else {
            total_items.div_ceil(items_per_page as u64) as u32
        };
        Self {
            current_page,
            total_pages,
            total_items,
            items_per_page,
        }
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }
}

/// One page of listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsPage {
    pub ads: Vec<Ad>,
    pub pagination: Pagination,
}

impl AdsPage {
    /// Ids of the listings on this page, in display order
    pub fn ids(&self) -> Vec<i64> {
        self.ads.iter().map(|ad| ad.id).collect()
    }

    pub fn total_items(&self) -> u64 {
        self.pagination.total_items
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }
}
