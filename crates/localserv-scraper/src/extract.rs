//! Markup extractor for the directory site's rendered pages.
//!
//! Everything here is pure string work: no I/O, no async. All of the
//! site-specific marker strings live in this module so a markup change
//! on the source site touches nothing outside it. Callers get four
//! operations: [`extract_business_links`], [`extract_result_count`],
//! [`extract_business_name`] and [`extract_services`].

use localserv_core::ServiceRecord;
use regex::Regex;

/// Start of the services block on a business detail page.
const SERVICES_START_MARKER: &str = "data-testid=\"services-services-list\"";
/// Optional end of the services block; when absent the block runs to
/// the end of the document.
const SERVICES_END_MARKER: &str = "id=\"reviews-section\"";

/// Strips tags, decodes HTML entities, and collapses whitespace runs
/// (including non-breaking spaces) to single spaces, trimming the ends.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").expect("valid regex");
    let no_tags = tag_re.replace_all(raw, "");
    let unescaped = decode_entities(&no_tags);
    let ws_re = Regex::new(r"\s+").expect("valid regex");
    ws_re.replace_all(&unescaped, " ").trim().to_string()
}

/// Decodes the named entities the source site actually emits plus
/// numeric character references. Unknown entities pass through verbatim.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        // Entity bodies are short; anything longer is not one.
        let semicolon = rest.find(';').filter(|&end| end > 1 && end <= 10);
        if let Some(end) = semicolon {
            if let Some(decoded) = decode_entity(&rest[1..end]) {
                out.push(decoded);
                rest = &rest[end + 1..];
                continue;
            }
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code);
    }
    named_entity(entity)
}

/// Named entities observed on the source site: markup basics plus the
/// Latin-1 accent set that Spanish business and service names use.
fn named_entity(name: &str) -> Option<char> {
    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "euro" => '€',
        "iexcl" => '¡',
        "iquest" => '¿',
        "ordf" => 'ª',
        "ordm" => 'º',
        "middot" => '·',
        "aacute" => 'á',
        "agrave" => 'à',
        "acirc" => 'â',
        "auml" => 'ä',
        "atilde" => 'ã',
        "eacute" => 'é',
        "egrave" => 'è',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "iacute" => 'í',
        "igrave" => 'ì',
        "icirc" => 'î',
        "iuml" => 'ï',
        "oacute" => 'ó',
        "ograve" => 'ò',
        "ocirc" => 'ô',
        "ouml" => 'ö',
        "otilde" => 'õ',
        "uacute" => 'ú',
        "ugrave" => 'ù',
        "ucirc" => 'û',
        "uuml" => 'ü',
        "ntilde" => 'ñ',
        "ccedil" => 'ç',
        "Aacute" => 'Á',
        "Eacute" => 'É',
        "Iacute" => 'Í',
        "Oacute" => 'Ó',
        "Uacute" => 'Ú',
        "Uuml" => 'Ü',
        "Ntilde" => 'Ñ',
        "Ccedil" => 'Ç',
        _ => return None,
    };
    Some(decoded)
}

/// Joins a site-relative business link against the base origin and
/// drops any query string or fragment.
///
/// The same business page always normalizes to the same string no
/// matter which search surfaced it.
#[must_use]
pub fn normalize_business_link(base_origin: &str, href: &str) -> String {
    let absolute = if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_origin.trim_end_matches('/'), href)
    };
    let path_only = absolute
        .split_once(['?', '#'])
        .map_or(absolute.as_str(), |(head, _)| head);
    path_only.to_string()
}

/// Extracts the ordered, deduplicated business detail links from one
/// result-page document.
///
/// A business link is a locale-prefixed path of the shape
/// `<prefix>/<digits>_<slug>`. Links are normalized (absolute,
/// query/fragment-free) before dedup so duplicate raw hrefs pointing at
/// the same page collapse.
#[must_use]
pub fn extract_business_links(html: &str, base_origin: &str, locale_prefix: &str) -> Vec<String> {
    let pattern = format!(
        "(?i)href=\"({}/\\d+_[^\"#?]+)",
        regex::escape(locale_prefix)
    );
    let link_re = Regex::new(&pattern).expect("valid regex");

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for cap in link_re.captures_iter(html) {
        let normalized = normalize_business_link(base_origin, &cap[1]);
        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }
    links
}

/// Reads the advertised result count from the page's primary heading.
///
/// The count is the first parenthesized integer in the `<h1>` text,
/// e.g. `Resultados (37)`. No heading, no parenthesized number, or a
/// malformed number all yield `None` — never zero.
#[must_use]
pub fn extract_result_count(html: &str) -> Option<usize> {
    let h1_re = Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid regex");
    let heading = clean_text(h1_re.captures(html)?.get(1)?.as_str());
    let count_re = Regex::new(r"\((\d{1,6})\)").expect("valid regex");
    let digits = count_re.captures(&heading)?.get(1)?.as_str();
    digits.parse::<usize>().ok()
}

/// Extracts the business display name from a detail page.
///
/// The name marker appears on a heading element on most pages and on a
/// generic container on a few layout variants; the first non-empty
/// cleaned text wins, in that priority order.
#[must_use]
pub fn extract_business_name(html: &str) -> Option<String> {
    let patterns = [
        r#"(?is)<h1[^>]*data-testid="business-name"[^>]*>\s*(.*?)\s*</h1>"#,
        r#"(?is)<div[^>]*data-testid="business-name"[^>]*>\s*(.*?)\s*</div>"#,
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(cap) = re.captures(html) {
            let name = clean_text(cap.get(1).map_or("", |m| m.as_str()));
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

/// Extracts the ordered service list from a business detail page.
///
/// Services live in a section bounded by the list marker and (when
/// present) the reviews anchor. Each service's price and duration are
/// read from the text between that service's name and the next one.
/// Entries whose cleaned name is empty are dropped.
#[must_use]
pub fn extract_services(html: &str) -> Vec<ServiceRecord> {
    let Some(start) = html.find(SERVICES_START_MARKER) else {
        return Vec::new();
    };
    let section = match html[start..].find(SERVICES_END_MARKER) {
        Some(rel_end) => &html[start..start + rel_end],
        None => &html[start..],
    };

    let name_re =
        Regex::new(r#"(?is)data-testid="service-name"[^>]*>\s*(.*?)\s*</"#).expect("valid regex");
    let matches: Vec<(usize, usize, String)> = name_re
        .captures_iter(section)
        .map(|cap| {
            let whole = cap.get(0).expect("group 0 always present");
            let name = clean_text(cap.get(1).map_or("", |m| m.as_str()));
            (whole.start(), whole.end(), name)
        })
        .collect();

    let mut services = Vec::new();
    for (index, (_, seg_start, name)) in matches.iter().enumerate() {
        let seg_end = matches
            .get(index + 1)
            .map_or(section.len(), |next| next.0);
        let segment = &section[*seg_start..seg_end];

        if name.is_empty() {
            continue;
        }

        let price_text = last_price_in(segment).unwrap_or_default();
        let price_cents = parse_price_cents(&price_text);
        let duration_minutes = extract_duration_text(segment)
            .as_deref()
            .and_then(parse_duration_minutes);

        services.push(ServiceRecord {
            name: name.clone(),
            price_text,
            price_cents,
            duration_minutes,
        });
    }
    services
}

/// Returns the cleaned text of the *last* currency-tagged price in a
/// segment.
///
/// When a discount is active the site renders the struck-through
/// original first and the current price last, so the last match is the
/// price in force. This is inferred from observed discount markup, not
/// a documented contract of the site.
#[must_use]
pub fn last_price_in(segment: &str) -> Option<String> {
    let price_re =
        Regex::new(r"(?i)[0-9]+,[0-9]{2}\s*(?:&nbsp;|\x{A0}|\s)?€").expect("valid regex");
    price_re
        .find_iter(segment)
        .last()
        .map(|m| clean_text(m.as_str()))
}

fn extract_duration_text(segment: &str) -> Option<String> {
    let duration_re =
        Regex::new(r#"(?is)data-testid="service-duration"[^>]*>\s*(.*?)\s*</"#)
            .expect("valid regex");
    duration_re
        .captures(segment)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
}

/// Converts a rendered price fragment like `25,00 €` or `1.250,50 €`
/// into integer minor units.
///
/// Thousands dots are dropped from the integer part; the fractional
/// part is left-padded/truncated to exactly two digits. Anything
/// non-numeric after stripping yields `None` — absence of a price is
/// not zero.
#[must_use]
pub fn parse_price_cents(price_text: &str) -> Option<i64> {
    let stripped = price_text
        .replace('€', "")
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ");
    let raw = stripped.trim().replace(' ', "");
    if raw.is_empty() {
        return None;
    }

    let (whole_raw, frac_raw) = match raw.split_once(',') {
        Some((whole, frac)) => (whole.to_string(), frac.to_string()),
        None => (raw, "00".to_string()),
    };
    let whole = whole_raw.replace('.', "");
    let frac: String = format!("{frac_raw}00").chars().take(2).collect();

    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let euros = whole.parse::<i64>().ok()?;
    let cents = frac.parse::<i64>().ok()?;
    Some(euros * 100 + cents)
}

/// Formats minor units back to the site's rendered style (no thousands
/// separators). Round-trips through [`parse_price_cents`].
#[must_use]
pub fn format_price_cents(cents: i64) -> String {
    format!("{},{:02} €", cents / 100, cents % 100)
}

/// Sums independent hour (`<n> h`) and minute (`<n> min`) components,
/// case-insensitively. Either, both, or neither may appear; a
/// non-positive or absent total yields `None`.
#[must_use]
pub fn parse_duration_minutes(duration_text: &str) -> Option<i64> {
    if duration_text.is_empty() {
        return None;
    }
    let lower = duration_text.to_lowercase();
    let hours_re = Regex::new(r"(\d+)\s*h").expect("valid regex");
    let mins_re = Regex::new(r"(\d+)\s*min").expect("valid regex");

    let mut total: i64 = 0;
    if let Some(cap) = hours_re.captures(&lower) {
        total += cap[1].parse::<i64>().ok()? * 60;
    }
    if let Some(cap) = mins_re.captures(&lower) {
        total += cap[1].parse::<i64>().ok()?;
    }
    (total > 0).then_some(total)
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
