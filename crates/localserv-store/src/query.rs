//! In-memory filtering, sorting, and paging over persisted rows.
//!
//! Everything operates on rows already loaded from a sink; nothing here
//! talks to the filesystem or network.

use std::collections::HashSet;

use localserv_core::IngestionRow;

/// Sortable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Business,
    Service,
    Price,
    ScrapedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Composable row filter; unset fields match everything.
#[derive(Debug, Default, Clone)]
pub struct RowFilter {
    /// Exact URL match.
    pub url: Option<String>,
    /// Case-insensitive substring over the business name.
    pub business_contains: Option<String>,
    /// Case-insensitive substring over the service name.
    pub service_contains: Option<String>,
    /// Inclusive bounds in minor units; unpriced rows never match a
    /// price bound.
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    /// Exact business-name membership.
    pub businesses: Option<HashSet<String>>,
}

impl RowFilter {
    #[must_use]
    pub fn matches(&self, row: &IngestionRow) -> bool {
        if let Some(url) = &self.url {
            if &row.url != url {
                return false;
            }
        }
        if let Some(needle) = &self.business_contains {
            if !contains_ci(&row.business_name, needle) {
                return false;
            }
        }
        if let Some(needle) = &self.service_contains {
            if !contains_ci(&row.service_name, needle) {
                return false;
            }
        }
        if let Some(set) = &self.businesses {
            if !set.contains(&row.business_name) {
                return false;
            }
        }
        if self.min_price_cents.is_some() || self.max_price_cents.is_some() {
            let Some(cents) = price_cents_of(&row.price) else {
                return false;
            };
            if self.min_price_cents.is_some_and(|min| cents < min) {
                return false;
            }
            if self.max_price_cents.is_some_and(|max| cents > max) {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Reads minor units off a persisted price string like `20,00 €`.
/// Unpriced or malformed strings yield `None`.
#[must_use]
pub fn price_cents_of(price: &str) -> Option<i64> {
    let cleaned: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let (whole, frac) = match cleaned.split_once(',') {
        Some((whole, frac)) => (whole, frac),
        None => (cleaned.as_str(), "00"),
    };
    let frac: String = format!("{frac}00").chars().take(2).collect();
    let euros = whole.parse::<i64>().ok()?;
    let cents = frac.parse::<i64>().ok()?;
    Some(euros * 100 + cents)
}

/// Filters, sorts, and pages `rows` in that order.
#[must_use]
pub fn query_rows(
    rows: &[IngestionRow],
    filter: &RowFilter,
    sort: Option<(SortKey, SortOrder)>,
    offset: usize,
    limit: Option<usize>,
) -> Vec<IngestionRow> {
    let mut selected: Vec<IngestionRow> =
        rows.iter().filter(|row| filter.matches(row)).cloned().collect();

    if let Some((key, order)) = sort {
        selected.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Business => a.business_name.cmp(&b.business_name),
                SortKey::Service => a.service_name.cmp(&b.service_name),
                // Unpriced rows sort before any priced row.
                SortKey::Price => price_cents_of(&a.price).cmp(&price_cents_of(&b.price)),
                SortKey::ScrapedAt => a.scraped_at.cmp(&b.scraped_at),
            };
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }

    let paged = selected.into_iter().skip(offset);
    match limit {
        Some(limit) => paged.take(limit).collect(),
        None => paged.collect(),
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
