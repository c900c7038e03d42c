use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn fetcher() -> PageFetcher {
    PageFetcher::new(5, "localserv-test/0.1").expect("client builds")
}

const BUSINESS_PATH: &str = "/es-es/123_salon-luna_4700_sevilla";

fn business_page() -> String {
    concat!(
        r#"<html><body><h1 data-testid="business-name">Sal&#243;n Luna</h1>"#,
        r#"<section data-testid="services-services-list">"#,
        r#"<div data-testid="service-name">Manicura</div>"#,
        r#"<span data-testid="service-duration">45 min</span><span>20,00&nbsp;€</span>"#,
        r#"<div data-testid="service-name">Pedicura</div>"#,
        r#"<span>Consultar</span>"#,
        r#"</section><div id="reviews-section"></div></body></html>"#,
    )
    .to_string()
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

#[test]
fn schemeless_url_gets_https() {
    assert_eq!(
        normalize_url("booksy.com/es-es/1_x_1_y").unwrap(),
        "https://booksy.com/es-es/1_x_1_y"
    );
}

#[test]
fn http_urls_pass_through() {
    assert_eq!(
        normalize_url(" http://b.test/es-es/1_x ").unwrap(),
        "http://b.test/es-es/1_x"
    );
}

#[test]
fn non_http_scheme_is_rejected() {
    assert!(matches!(
        normalize_url("ftp://b.test/x"),
        Err(ScrapeError::InvalidUrl { .. })
    ));
}

#[test]
fn empty_url_is_rejected() {
    assert!(matches!(
        normalize_url("   "),
        Err(ScrapeError::InvalidUrl { .. })
    ));
}

#[test]
fn city_guess_title_cases_the_slug() {
    let url = "https://booksy.com/es-es/2_peluqueria_4800_dos-hermanas";
    assert_eq!(guess_city_from_url(url).as_deref(), Some("Dos Hermanas"));
}

#[test]
fn city_guess_splits_at_the_last_underscore_without_zone_code() {
    let url = "https://booksy.com/es-es/123_acme";
    assert_eq!(guess_city_from_url(url).as_deref(), Some("Acme"));
}

#[test]
fn city_guess_none_without_any_underscore() {
    assert_eq!(guess_city_from_url("https://booksy.com/es-es/acerca"), None);
}

#[test]
fn city_guess_none_when_last_underscore_is_in_an_earlier_segment() {
    assert_eq!(
        guess_city_from_url("https://booksy.com/es-es/1_x/extra/path"),
        None
    );
}

#[test]
fn external_id_is_first_numeric_path_segment() {
    let url = "https://booksy.com/es-es/123_salon-luna_4700_sevilla";
    assert_eq!(guess_external_id(url).as_deref(), Some("123"));
    assert_eq!(guess_external_id("https://booksy.com/es-es/acerca"), None);
}

// ---------------------------------------------------------------------------
// extraction over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extracts_full_record_from_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUSINESS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(business_page()))
        .mount(&server)
        .await;

    let url = format!("{}{BUSINESS_PATH}", server.uri());
    let record = extract_business(&fetcher(), &url, None)
        .await
        .expect("record");

    assert_eq!(record.name, "Sal\u{f3}n Luna");
    assert_eq!(record.source_url, url);
    assert_eq!(record.external_id.as_deref(), Some("123"));
    assert_eq!(record.city.as_deref(), Some("Sevilla"));
    assert_eq!(record.services.len(), 2);
    assert_eq!(record.services[0].name, "Manicura");
    assert_eq!(record.services[0].price_cents, Some(2000));
    assert_eq!(record.services[0].duration_minutes, Some(45));
    assert_eq!(record.services[1].price_cents, None);
}

#[tokio::test]
async fn city_override_beats_url_guess() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUSINESS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(business_page()))
        .mount(&server)
        .await;

    let url = format!("{}{BUSINESS_PATH}", server.uri());
    let record = extract_business(&fetcher(), &url, Some("Sevilla Este"))
        .await
        .expect("record");
    assert_eq!(record.city.as_deref(), Some("Sevilla Este"));
}

#[tokio::test]
async fn page_without_name_is_an_extraction_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><h1>Hola</h1></html>"))
        .mount(&server)
        .await;

    let url = format!("{}{BUSINESS_PATH}", server.uri());
    let err = extract_business(&fetcher(), &url, None).await.unwrap_err();
    assert!(matches!(err, ScrapeError::MissingBusinessName { .. }));
    assert!(!err.is_retrieval());
}

#[tokio::test]
async fn page_without_services_is_an_extraction_error() {
    let server = MockServer::start().await;
    let body = r#"<html><h1 data-testid="business-name">Solo Nombre</h1></html>"#;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let url = format!("{}{BUSINESS_PATH}", server.uri());
    let err = extract_business(&fetcher(), &url, None).await.unwrap_err();
    assert!(matches!(err, ScrapeError::NoServices { .. }));
}

#[tokio::test]
async fn server_error_is_a_retrieval_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let url = format!("{}{BUSINESS_PATH}", server.uri());
    let err = extract_business(&fetcher(), &url, None).await.unwrap_err();
    assert!(err.is_retrieval());
}
