use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const PREFIX: &str = "/es-es";

fn fetcher() -> PageFetcher {
    PageFetcher::new(5, "localserv-test/0.1").expect("client builds")
}

fn links_page(hrefs: &[&str]) -> String {
    let body: String = hrefs
        .iter()
        .map(|href| format!("<a href=\"{href}\">x</a>"))
        .collect();
    format!("<html><body><h1>Resultados</h1>{body}</body></html>")
}

// ---------------------------------------------------------------------------
// slugify
// ---------------------------------------------------------------------------

#[test]
fn slugify_folds_accents_and_hyphenates() {
    assert_eq!(slugify("Alcalá de Henares"), "alcala-de-henares");
    assert_eq!(slugify("La Coruña"), "la-coruna");
}

#[test]
fn slugify_collapses_separator_runs() {
    assert_eq!(slugify("  Dos   Hermanas__Norte "), "dos-hermanas-norte");
}

#[test]
fn slugify_drops_punctuation() {
    assert_eq!(slugify("Jerez (de la Frontera)!"), "jerez-de-la-frontera");
}

#[test]
fn slugify_empty_input_falls_back() {
    assert_eq!(slugify(""), "local");
    assert_eq!(slugify("¡¿!?"), "local");
}

// ---------------------------------------------------------------------------
// token / zone helpers
// ---------------------------------------------------------------------------

#[test]
fn token_is_read_from_link_suffix() {
    let link = "https://booksy.com/es-es/123_salon-luna_4700_sevilla";
    assert_eq!(location_token_of(link).as_deref(), Some("4700_sevilla"));
}

#[test]
fn link_without_token_suffix_yields_none() {
    assert_eq!(location_token_of("https://booksy.com/es-es/acerca"), None);
}

#[test]
fn zone_code_is_numeric_prefix() {
    assert_eq!(zone_code_of("4700_sevilla").as_deref(), Some("4700"));
    assert_eq!(zone_code_of("sevilla"), None);
    assert_eq!(zone_code_of("4a00_sevilla"), None);
}

#[test]
fn city_slug_filter_keeps_matching_suffix_only() {
    let links = vec![
        "https://b.test/es-es/1_a_4700_sevilla".to_string(),
        "https://b.test/es-es/2_b_4800_dos-hermanas".to_string(),
        "https://b.test/es-es/3_c_4701_sevilla".to_string(),
    ];
    let filtered = filter_by_city_slug(&links, "sevilla");
    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|l| l.ends_with("_sevilla")));
}

#[test]
fn empty_slug_filters_nothing() {
    let links = vec!["https://b.test/es-es/1_a_4700_sevilla".to_string()];
    assert_eq!(filter_by_city_slug(&links, "").len(), 1);
}

#[test]
fn majority_vote_picks_most_frequent_token() {
    let links = vec![
        "https://b.test/es-es/1_a_4700_sevilla".to_string(),
        "https://b.test/es-es/2_b_4800_dos-hermanas".to_string(),
        "https://b.test/es-es/3_c_4700_sevilla".to_string(),
    ];
    assert_eq!(majority_token(&links).as_deref(), Some("4700_sevilla"));
}

#[test]
fn majority_vote_tie_breaks_to_first_encountered() {
    let links = vec![
        "https://b.test/es-es/1_a_4800_dos-hermanas".to_string(),
        "https://b.test/es-es/2_b_4700_sevilla".to_string(),
    ];
    assert_eq!(majority_token(&links).as_deref(), Some("4800_dos-hermanas"));
}

#[test]
fn majority_vote_over_no_tokens_is_none() {
    assert_eq!(majority_token(&[]), None);
}

// ---------------------------------------------------------------------------
// URL builders
// ---------------------------------------------------------------------------

#[test]
fn search_url_percent_encodes_query() {
    let url = search_url("https://booksy.com", PREFIX, "41001 Sevilla");
    assert_eq!(url, "https://booksy.com/es-es/s?query=41001%20Sevilla");
}

#[test]
fn category_url_embeds_token() {
    let url = category_url("https://booksy.com", PREFIX, "maquillaje", "4700_sevilla");
    assert_eq!(url, "https://booksy.com/es-es/s/maquillaje/4700_sevilla");
}

// ---------------------------------------------------------------------------
// token resolution over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolves_majority_token_from_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/es-es/s"))
        .and(query_param("query", "41001 Sevilla"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links_page(&[
            "/es-es/1_salon-a_4700_sevilla",
            "/es-es/2_salon-b_4800_dos-hermanas",
            "/es-es/3_salon-c_4700_sevilla",
        ])))
        .mount(&server)
        .await;

    let resolution =
        resolve_location_token(&fetcher(), &server.uri(), PREFIX, "41001", "Sevilla").await;
    assert_eq!(resolution.token.as_deref(), Some("4700_sevilla"));
    assert!(resolution.probe_url.contains("query=41001%20Sevilla"));
}

#[tokio::test]
async fn unresolved_when_no_links_carry_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/es-es/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nada</html>"))
        .mount(&server)
        .await;

    let resolution =
        resolve_location_token(&fetcher(), &server.uri(), PREFIX, "41001", "Sevilla").await;
    assert!(resolution.token.is_none());
}

#[tokio::test]
async fn unresolved_when_probe_fetch_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolution =
        resolve_location_token(&fetcher(), &server.uri(), PREFIX, "", "Sevilla").await;
    assert!(resolution.token.is_none());
    assert!(resolution.probe_url.contains("query=Sevilla"));
}

// ---------------------------------------------------------------------------
// city-wide expansion over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn city_wide_detects_zones_and_merges_expansion_links() {
    let server = MockServer::start().await;

    // Primary city query: two zones for the city plus one leaked
    // neighbour that the slug filter drops.
    Mock::given(method("GET"))
        .and(path("/es-es/s"))
        .and(query_param("query", "Testville"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links_page(&[
            "/es-es/1_salon-a_100_testville",
            "/es-es/2_salon-b_200_testville",
            "/es-es/3_salon-c_300_otherton",
        ])))
        .mount(&server)
        .await;

    // Zone 100 expansion adds one new link and repeats a known one.
    Mock::given(method("GET"))
        .and(path("/es-es/s"))
        .and(query_param("query", "maquillaje 100 Testville"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links_page(&[
            "/es-es/1_salon-a_100_testville",
            "/es-es/4_salon-d_100_testville",
        ])))
        .mount(&server)
        .await;

    // Zone 200 expansion returns nothing for the city; the unfiltered
    // set is kept instead.
    Mock::given(method("GET"))
        .and(path("/es-es/s"))
        .and(query_param("query", "maquillaje 200 Testville"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links_page(&[
            "/es-es/5_salon-e_300_otherton",
        ])))
        .mount(&server)
        .await;

    let limits = DiscoveryLimits {
        max_links: 0,
        max_pages: 200,
    };
    let result = discover_city_wide(
        &fetcher(),
        &server.uri(),
        PREFIX,
        "Testville",
        "maquillaje",
        limits,
    )
    .await;

    assert_eq!(result.city_slug, "testville");
    assert_eq!(result.zone_codes, vec!["100".to_string(), "200".to_string()]);
    let suffixes: Vec<String> = result
        .links
        .iter()
        .map(|l| l.rsplit('/').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        suffixes,
        vec![
            "1_salon-a_100_testville",
            "2_salon-b_200_testville",
            "4_salon-d_100_testville",
            "5_salon-e_300_otherton",
        ]
    );
}

#[tokio::test]
async fn city_wide_respects_link_cap_during_expansion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/es-es/s"))
        .and(query_param("query", "Testville"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links_page(&[
            "/es-es/1_a_100_testville",
            "/es-es/2_b_200_testville",
        ])))
        .mount(&server)
        .await;

    let limits = DiscoveryLimits {
        max_links: 2,
        max_pages: 200,
    };
    let result = discover_city_wide(
        &fetcher(),
        &server.uri(),
        PREFIX,
        "Testville",
        "maquillaje",
        limits,
    )
    .await;

    // Cap already met by the primary query: no expansion fetches happen.
    assert_eq!(result.links.len(), 2);
    assert_eq!(result.zone_codes.len(), 2);
}

#[tokio::test]
async fn city_wide_with_blank_city_is_empty() {
    let server = MockServer::start().await;
    let limits = DiscoveryLimits {
        max_links: 0,
        max_pages: 200,
    };
    let result =
        discover_city_wide(&fetcher(), &server.uri(), PREFIX, "  ", "maquillaje", limits).await;
    assert!(result.links.is_empty());
    assert!(result.zone_codes.is_empty());
}