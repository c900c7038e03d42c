//! Link discovery: walks paginated search results for one query and
//! accumulates deduplicated business links.
//!
//! The source gives no reliable "last page" signal, so termination is
//! heuristic: a link cap, a hard page cap, an advertised result count
//! read from the first page's heading, an empty page, or a page that
//! adds nothing new.

use std::collections::HashSet;

use crate::extract::{extract_business_links, extract_result_count};
use crate::fetch::PageFetcher;

/// Ordered, deduplicated set of normalized business links.
///
/// Owned by a single logical run and passed by reference wherever links
/// are merged, so membership checks and appends stay atomic together if
/// concurrency is ever layered on top.
#[derive(Debug, Default)]
pub struct LinkSet {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl LinkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a link, preserving encounter order. Returns `true` when
    /// the link was not already present.
    pub fn insert(&mut self, link: String) -> bool {
        if self.seen.contains(&link) {
            return false;
        }
        self.seen.insert(link.clone());
        self.links.push(link);
        true
    }

    #[must_use]
    pub fn contains(&self, link: &str) -> bool {
        self.seen.contains(link)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    #[must_use]
    pub fn into_links(self) -> Vec<String> {
        self.links
    }
}

/// Caps applied to one discovery run.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryLimits {
    /// Maximum links to accumulate; 0 = unbounded.
    pub max_links: usize,
    /// Hard cap on pages fetched for one query.
    pub max_pages: usize,
}

impl DiscoveryLimits {
    #[must_use]
    pub fn link_cap_reached(&self, accumulated: usize) -> bool {
        self.max_links > 0 && accumulated >= self.max_links
    }
}

/// Result of one discovery run, with diagnostics.
#[derive(Debug)]
pub struct DiscoveredLinks {
    pub links: Vec<String>,
    pub pages_fetched: usize,
    /// Result count advertised by the first page's heading, when readable.
    /// An early-stop heuristic only, never a correctness guarantee.
    pub advertised_total: Option<usize>,
}

/// Appends the page-number parameter for pages past the first.
///
/// Page 1 is the base URL unmodified; later pages get
/// `businessesPage=<n>` joined with `&` or `?` as appropriate.
#[must_use]
pub fn build_paged_url(base_url: &str, page: usize) -> String {
    if page <= 1 {
        return base_url.to_string();
    }
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}businessesPage={page}")
}

/// Paginates one search query and returns the deduplicated links found.
///
/// A retrieval failure on any page is non-fatal: discovery stops and
/// returns what has been accumulated, treating the failure as "no more
/// pages". There are no retries here.
pub async fn discover_links(
    fetcher: &PageFetcher,
    base_url: &str,
    base_origin: &str,
    locale_prefix: &str,
    limits: DiscoveryLimits,
) -> DiscoveredLinks {
    let mut found = LinkSet::new();
    let mut advertised_total: Option<usize> = None;
    let mut pages_fetched = 0usize;

    for page in 1..=limits.max_pages.max(1) {
        let page_url = build_paged_url(base_url, page);
        let html = match fetcher.fetch_html(&page_url).await {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(page_url, error = %err, "page fetch failed; stopping discovery");
                break;
            }
        };
        pages_fetched = page;

        if page == 1 {
            advertised_total = extract_result_count(&html);
            if let Some(total) = advertised_total {
                tracing::info!(base_url, total, "advertised result count");
            }
        }

        let page_links = extract_business_links(&html, base_origin, locale_prefix);
        let mut added = 0usize;
        for link in &page_links {
            if found.insert(link.clone()) {
                added += 1;
                if limits.link_cap_reached(found.len()) {
                    break;
                }
            }
        }
        tracing::info!(page, added, accumulated = found.len(), "discovery page done");

        // Stop conditions, in order: link cap; an empty page (no more
        // content); advertised total reached; a page with nothing new
        // (loop or end of results).
        if limits.link_cap_reached(found.len()) {
            break;
        }
        if page_links.is_empty() {
            break;
        }
        if advertised_total.is_some_and(|total| found.len() >= total) {
            break;
        }
        if added == 0 {
            break;
        }
    }

    DiscoveredLinks {
        links: found.into_links(),
        pages_fetched,
        advertised_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_url_is_unmodified() {
        assert_eq!(
            build_paged_url("https://x.test/es-es/s?query=sevilla", 1),
            "https://x.test/es-es/s?query=sevilla"
        );
    }

    #[test]
    fn later_pages_join_with_ampersand_when_query_present() {
        assert_eq!(
            build_paged_url("https://x.test/es-es/s?query=sevilla", 3),
            "https://x.test/es-es/s?query=sevilla&businessesPage=3"
        );
    }

    #[test]
    fn later_pages_join_with_question_mark_when_no_query() {
        assert_eq!(
            build_paged_url("https://x.test/es-es/s/maquillaje/4700_sevilla", 2),
            "https://x.test/es-es/s/maquillaje/4700_sevilla?businessesPage=2"
        );
    }

    #[test]
    fn link_set_preserves_encounter_order() {
        let mut set = LinkSet::new();
        assert!(set.insert("b".to_string()));
        assert!(set.insert("a".to_string()));
        assert!(!set.insert("b".to_string()));
        assert_eq!(set.links(), ["b", "a"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn zero_max_links_means_unbounded() {
        let limits = DiscoveryLimits {
            max_links: 0,
            max_pages: 200,
        };
        assert!(!limits.link_cap_reached(1_000_000));
        let capped = DiscoveryLimits {
            max_links: 10,
            max_pages: 200,
        };
        assert!(capped.link_cap_reached(10));
        assert!(!capped.link_cap_reached(9));
    }
}

#[cfg(test)]
#[path = "discover_http_test.rs"]
mod http_tests;
