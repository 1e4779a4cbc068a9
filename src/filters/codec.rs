//! Filter codec
//!
//! Converts between [`FilterState`] and the flat query string shown in the
//! address bar, e.g. `page=2&limit=10&status=pending&status=draft&search=bike`.
//!
//! Decoding is lenient: anything malformed falls back to the default or is
//! dropped, so any URL a moderator pastes yields a valid state. Encoding is
//! deterministic and `decode(encode(f)) == f` holds for every valid `f`.

use std::borrow::Cow;

use super::{dedup_statuses, FilterState, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::cache::LIST_KEY_PREFIX;
use crate::models::AdStatus;

/// Decode a query string (with or without the leading `?`)
pub fn decode(query: &str) -> FilterState {
    let pairs = parse_pairs(query);
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    };

    let page = first("page")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(DEFAULT_PAGE);
    let limit = first("limit")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|limit| *limit >= 1)
        .unwrap_or(DEFAULT_LIMIT);

    let status = dedup_statuses(
        pairs
            .iter()
            .filter(|(key, _)| key == "status")
            .filter_map(|(_, value)| value.parse::<AdStatus>().ok()),
    );

    let mut min_price = first("minPrice").and_then(parse_price);
    let mut max_price = first("maxPrice").and_then(parse_price);
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            min_price = Some(max);
            max_price = Some(min);
        }
    }

    FilterState {
        page,
        limit,
        status,
        category_id: first("categoryId").and_then(|v| v.parse().ok()),
        search: first("search").map(str::to_string),
        min_price,
        max_price,
        sort_by: first("sortBy").and_then(|v| v.parse().ok()),
        sort_order: first("sortOrder").and_then(|v| v.parse().ok()),
    }
}

/// Encode filters in the fixed key order, omitting absent fields
pub fn encode(filters: &FilterState) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut push = |key: &str, value: &str| {
        if !value.is_empty() {
            parts.push(format!("{}={}", key, urlencoding::encode(value)));
        }
    };

    push("page", &filters.page.to_string());
    push("limit", &filters.limit.to_string());
    for status in &filters.status {
        push("status", status.as_str());
    }
    if let Some(category_id) = filters.category_id {
        push("categoryId", &category_id.to_string());
    }
    if let Some(search) = &filters.search {
        push("search", search);
    }
    if let Some(min_price) = filters.min_price {
        push("minPrice", &min_price.to_string());
    }
    if let Some(max_price) = filters.max_price {
        push("maxPrice", &max_price.to_string());
    }
    if let Some(sort_by) = filters.sort_by {
        push("sortBy", sort_by.as_str());
    }
    if let Some(sort_order) = filters.sort_order {
        push("sortOrder", sort_order.as_str());
    }

    parts.join("&")
}

/// Query parameters for `GET /ads`
///
/// Same fields as [`encode`], unescaped, with statuses sent as `status[]`.
pub fn to_api_query(filters: &FilterState) -> Vec<(String, String)> {
    let mut query = vec![
        ("page".to_string(), filters.page.to_string()),
        ("limit".to_string(), filters.limit.to_string()),
    ];
    for status in &filters.status {
        query.push(("status[]".to_string(), status.as_str().to_string()));
    }
    if let Some(category_id) = filters.category_id {
        query.push(("categoryId".to_string(), category_id.to_string()));
    }
    if let Some(search) = filters.search.as_ref().filter(|s| !s.is_empty()) {
        query.push(("search".to_string(), search.clone()));
    }
    if let Some(min_price) = filters.min_price {
        query.push(("minPrice".to_string(), min_price.to_string()));
    }
    if let Some(max_price) = filters.max_price {
        query.push(("maxPrice".to_string(), max_price.to_string()));
    }
    if let Some(sort_by) = filters.sort_by {
        query.push(("sortBy".to_string(), sort_by.as_str().to_string()));
    }
    if let Some(sort_order) = filters.sort_order {
        query.push(("sortOrder".to_string(), sort_order.as_str().to_string()));
    }
    query
}

/// Cache key of the list page for `filters`
///
/// Status order does not change the server's answer, so statuses are sorted
/// before encoding.
pub fn cache_key(filters: &FilterState) -> String {
    let mut normalized = filters.clone();
    normalized.status.sort();
    format!("{}{}", LIST_KEY_PREFIX, encode(&normalized))
}

fn parse_price(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    query
        .strip_prefix('?')
        .unwrap_or(query)
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(segment), String::new()),
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => {
            String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
        }
    }
}
