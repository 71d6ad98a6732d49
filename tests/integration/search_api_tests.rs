use super::*;
use quickdeal_watcher::plugins::sources::StructuredQuerySource;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> StructuredQuerySource {
    let config = get_test_config(&server.uri(), &["201014"]);
    StructuredQuerySource::new(config.search_api).expect("client builds")
}

#[tokio::test]
async fn test_search_request_carries_zone_and_tag() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "pincode": "201014",
            "serviceabilityTags": ["JIOMART_QUICK"],
            "sort": "discount_desc",
            "page": 1,
            "rows": 50,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                product_json("A", "Basmati Rice 5kg", 80),
                product_json("B", "Sunflower Oil 1L", 60),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let deals = source_for(&server).fetch(&zone("201014")).await?;

    assert_eq!(deals.len(), 2);
    assert_eq!(deals[0].id(), "A");
    assert_eq!(deals[0].name(), "Basmati Rice 5kg");
    assert_eq!(deals[0].discount(), Decimal::from(80));
    assert_eq!(deals[0].url(), "https://www.jiomart.com/p/groceries/A");

    Ok(())
}

#[tokio::test]
async fn test_malformed_products_are_skipped() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                product_json("A", "Good", 80),
                { "id": "B", "displayName": "No discount", "seoUrl": "/b" },
                { "id": "C", "discount": 90, "seoUrl": "/c" },
                { "displayName": "No id", "discount": 90, "seoUrl": "/d" },
                { "id": 77, "displayName": "Numeric id", "discount": "91.6", "seoUrl": "e" },
            ]
        })))
        .mount(&server)
        .await;

    let deals = source_for(&server).fetch(&zone("201014")).await?;
    let ids: Vec<&str> = deals.iter().map(|d| d.id()).collect();

    assert_eq!(ids, vec!["A", "77"]);
    assert_eq!(deals[1].discount(), Decimal::from_str("91.6")?);
    assert_eq!(deals[1].url(), "https://www.jiomart.com/p/e");

    Ok(())
}

#[tokio::test]
async fn test_server_error_is_source_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = source_for(&server).fetch(&zone("201014")).await;
    assert!(matches!(result, Err(SourceError::Status { status: 500 })));
}

#[tokio::test]
async fn test_body_without_products_is_shape_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let result = source_for(&server).fetch(&zone("201014")).await;
    assert!(matches!(result, Err(SourceError::Shape(_))));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "products": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let result = source_for(&server).fetch(&zone("201014")).await;
    assert!(matches!(result, Err(SourceError::Timeout { seconds: 2 })));
}
