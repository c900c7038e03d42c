//! Location token inference and city-wide coverage expansion.
//!
//! The site keys category searches on an internal token of the form
//! `<zone-code>_<city-slug>`, but exposes no lookup for it. The token is
//! inferred statistically: probe a free-text search and take the
//! majority token across the business links that come back. A city may
//! be partitioned into several zone codes; expansion re-queries per
//! detected code to widen coverage beyond the shallow per-query
//! pagination.

use std::collections::{HashMap, HashSet};

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use regex::Regex;

use crate::discover::{discover_links, DiscoveryLimits, LinkSet};
use crate::fetch::PageFetcher;

/// Turns free text into the site's slug alphabet: ASCII-folded
/// lowercase with hyphen-separated words. Empty input slugs to
/// `"local"`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let folded: String = text.chars().map(fold_char).collect();
    let lowered = folded.to_lowercase();

    let mut cleaned = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            'a'..='z' | '0'..='9' | '-' => cleaned.push(c),
            c if c.is_whitespace() || c == '_' => cleaned.push(' '),
            _ => {}
        }
    }

    let hyphenated = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let collapse_re = Regex::new(r"-+").expect("valid regex");
    let slug = collapse_re
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string();

    if slug.is_empty() {
        "local".to_string()
    } else {
        slug
    }
}

/// ASCII fold for the diacritics that occur in Spanish place names.
fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        _ => c,
    }
}

/// Builds the free-text search URL for a probe query.
#[must_use]
pub fn search_url(base_origin: &str, locale_prefix: &str, query_text: &str) -> String {
    let encoded = utf8_percent_encode(query_text, NON_ALPHANUMERIC).to_string();
    format!("{base_origin}{locale_prefix}/s?query={encoded}")
}

/// Builds the category-scoped search URL for a resolved location token.
#[must_use]
pub fn category_url(
    base_origin: &str,
    locale_prefix: &str,
    seed_category: &str,
    location_token: &str,
) -> String {
    format!("{base_origin}{locale_prefix}/s/{seed_category}/{location_token}")
}

/// Reads the `<zone-code>_<city-slug>` suffix off a normalized business
/// link, when present.
#[must_use]
pub fn location_token_of(link: &str) -> Option<String> {
    let token_re = Regex::new(r"(?i)_([0-9]+_[a-z0-9-]+)$").expect("valid regex");
    token_re
        .captures(link)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Numeric zone-code prefix of a location token.
#[must_use]
pub fn zone_code_of(location_token: &str) -> Option<String> {
    let (numeric, _) = location_token.split_once('_')?;
    if !numeric.is_empty() && numeric.bytes().all(|b| b.is_ascii_digit()) {
        Some(numeric.to_string())
    } else {
        None
    }
}

/// Keeps only links whose location token ends in `_<city_slug>`.
/// An empty slug filters nothing.
#[must_use]
pub fn filter_by_city_slug(links: &[String], city_slug: &str) -> Vec<String> {
    if city_slug.is_empty() {
        return links.to_vec();
    }
    let suffix = format!("_{city_slug}");
    links
        .iter()
        .filter(|link| {
            location_token_of(link)
                .is_some_and(|token| token.to_lowercase().ends_with(&suffix))
        })
        .cloned()
        .collect()
}

/// Outcome of a token probe. `token` is a confidence-free best guess;
/// `None` means the probe surfaced no parseable tokens (or failed to
/// fetch), which callers must handle distinctly from a real token.
#[derive(Debug)]
pub struct Resolution {
    pub token: Option<String>,
    /// The probe URL actually queried, for diagnostics.
    pub probe_url: String,
}

/// Infers the site's location token for a postal code + city pair.
///
/// Issues one probe search (postal code and city joined by a space,
/// empty parts omitted) and majority-votes over the tokens observed in
/// the returned links; ties break toward the first-encountered token.
/// The probe's links are noisy — tokens for unrelated nearby towns are
/// expected and outvoted, not filtered.
pub async fn resolve_location_token(
    fetcher: &PageFetcher,
    base_origin: &str,
    locale_prefix: &str,
    postal_code: &str,
    city_hint: &str,
) -> Resolution {
    let query_text = [postal_code.trim(), city_hint.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let probe_url = search_url(base_origin, locale_prefix, &query_text);

    let html = match fetcher.fetch_html(&probe_url).await {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!(probe_url, error = %err, "token probe fetch failed");
            return Resolution {
                token: None,
                probe_url,
            };
        }
    };

    let links = crate::extract::extract_business_links(&html, base_origin, locale_prefix);
    let token = majority_token(&links);
    Resolution { token, probe_url }
}

/// Most frequent location token across `links`, ties broken by
/// first-encountered order.
fn majority_token(links: &[String]) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for link in links {
        let Some(token) = location_token_of(link) else {
            continue;
        };
        let count = counts.entry(token.clone()).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    // Strict comparison keeps the first-encountered token on ties.
    let mut best: Option<(String, usize)> = None;
    for token in order {
        let count = counts[&token];
        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some((token, count));
        }
    }
    best.map(|(token, _)| token)
}

/// Result of a city-wide expansion run.
#[derive(Debug)]
pub struct CityWideDiscovery {
    pub links: Vec<String>,
    /// Zone codes detected in the primary city query, in encounter order.
    pub zone_codes: Vec<String>,
    pub city_slug: String,
}

/// Discovers links for a whole city without a postal code.
///
/// Runs one plain city-name query, tightens it to the city's slug when
/// that filter still matches anything, then re-queries per detected
/// zone code (seed category + code + city) and merges the extra links,
/// stopping once the link cap is reached.
pub async fn discover_city_wide(
    fetcher: &PageFetcher,
    base_origin: &str,
    locale_prefix: &str,
    city_hint: &str,
    seed_category: &str,
    limits: DiscoveryLimits,
) -> CityWideDiscovery {
    let city_slug = slugify(city_hint);
    let query_city = city_hint.trim();
    if query_city.is_empty() {
        return CityWideDiscovery {
            links: Vec::new(),
            zone_codes: Vec::new(),
            city_slug,
        };
    }

    let primary_url = search_url(base_origin, locale_prefix, query_city);
    tracing::info!(primary_url, city_slug, "city-wide discovery");
    let primary = discover_links(fetcher, &primary_url, base_origin, locale_prefix, limits).await;

    // Nearby-town results leak into city queries; keep the slug filter
    // only when it leaves something behind.
    let mut links = {
        let filtered = filter_by_city_slug(&primary.links, &city_slug);
        if filtered.is_empty() {
            primary.links
        } else {
            tracing::info!(
                kept = filtered.len(),
                city_slug,
                "tightened results to city slug"
            );
            filtered
        }
    };

    let zone_codes = detect_zone_codes(&links);
    if !zone_codes.is_empty() {
        tracing::info!(city_hint, codes = ?zone_codes, "zone codes detected");
    }

    let mut accumulated = LinkSet::new();
    for link in links.drain(..) {
        accumulated.insert(link);
    }

    for code in &zone_codes {
        if limits.link_cap_reached(accumulated.len()) {
            break;
        }
        let query_text = [seed_category.replace('-', " ").as_str(), code, query_city]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let query_url = search_url(base_origin, locale_prefix, &query_text);
        tracing::info!(code, query_url, "zone expansion query");

        let extra = discover_links(fetcher, &query_url, base_origin, locale_prefix, limits).await;
        let filtered = filter_by_city_slug(&extra.links, &city_slug);
        let merged = if filtered.is_empty() {
            extra.links
        } else {
            filtered
        };

        let mut added = 0usize;
        for link in merged {
            if limits.link_cap_reached(accumulated.len()) {
                break;
            }
            if accumulated.insert(link) {
                added += 1;
            }
        }
        tracing::info!(code, added, accumulated = accumulated.len(), "zone merged");
    }

    CityWideDiscovery {
        links: accumulated.into_links(),
        zone_codes,
        city_slug,
    }
}

/// Unique zone codes across `links`, in encounter order.
fn detect_zone_codes(links: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut codes: Vec<String> = Vec::new();
    for link in links {
        let Some(code) = location_token_of(link).as_deref().and_then(zone_code_of) else {
            continue;
        };
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}

#[cfg(test)]
#[path = "locate_test.rs"]
mod tests;
