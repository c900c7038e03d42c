//! Business detail page extraction: one URL in, one structured record
//! out.

use localserv_core::BusinessRecord;
use regex::Regex;

use crate::error::ScrapeError;
use crate::extract::{extract_business_name, extract_services};
use crate::fetch::PageFetcher;

/// Normalizes a user- or file-supplied business URL.
///
/// Schemeless input gets `https://` prepended; anything that is not
/// http(s) after that is rejected.
pub fn normalize_url(raw: &str) -> Result<String, ScrapeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScrapeError::InvalidUrl {
            url: raw.to_string(),
            reason: "empty".to_string(),
        });
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_string());
    }
    if trimmed.contains("://") {
        return Err(ScrapeError::InvalidUrl {
            url: raw.to_string(),
            reason: "unsupported scheme".to_string(),
        });
    }
    Ok(format!("https://{trimmed}"))
}

/// Best-effort city guess from the link's trailing slug: the text
/// after the URL's last underscore, hyphens as spaces, title-cased.
///
/// Works for the usual `_<zone-code>_<city-slug>` suffix and for bare
/// `<id>_<slug>` links alike. URLs whose last underscore sits in an
/// earlier path segment carry no usable slug and yield `None`.
#[must_use]
pub fn guess_city_from_url(url: &str) -> Option<String> {
    let (_, slug) = url.rsplit_once('_')?;
    if slug.contains('/') {
        return None;
    }
    let city = slug
        .split('-')
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    (!city.is_empty()).then_some(city)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The site's numeric business id, read from the first path segment of
/// the shape `<digits>_<slug>`.
#[must_use]
pub fn guess_external_id(url: &str) -> Option<String> {
    let id_re = Regex::new(r"/(\d+)_[^/]+").expect("valid regex");
    id_re
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fetches one business page and extracts its record.
///
/// A page without a recognizable business name or without any services
/// is an extraction failure for that URL, not a partial record.
/// `city_override` replaces the URL-derived city guess when given.
pub async fn extract_business(
    fetcher: &PageFetcher,
    url: &str,
    city_override: Option<&str>,
) -> Result<BusinessRecord, ScrapeError> {
    let url = normalize_url(url)?;
    let html = fetcher.fetch_html(&url).await?;

    let name = extract_business_name(&html).ok_or_else(|| ScrapeError::MissingBusinessName {
        url: url.clone(),
    })?;

    let services = extract_services(&html);
    if services.is_empty() {
        return Err(ScrapeError::NoServices { url });
    }

    let city = match city_override {
        Some(city) if !city.trim().is_empty() => Some(city.trim().to_string()),
        _ => guess_city_from_url(&url),
    };

    tracing::debug!(url, business = %name, services = services.len(), "extracted business");
    Ok(BusinessRecord {
        name,
        external_id: guess_external_id(&url),
        city,
        source_url: url,
        services,
    })
}

#[cfg(test)]
#[path = "business_test.rs"]
mod tests;
