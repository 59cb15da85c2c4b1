mod common;

use axum::http::StatusCode;
use common::{code_of, spawn_app};
use serde_json::{Value, json};

const BRAND: &str = "go.brand.test";

async fn create_branded(app: &common::TestApp, domain: &str) -> Value {
    app.create_link(json!({
        "originalUrl": "https://example.com/spring-sale",
        "sessionId": "s1",
        "customDomain": domain,
    }))
    .await
}

#[tokio::test]
async fn test_create_on_custom_domain() {
    let app = spawn_app();

    let body = create_branded(&app, "https://Go.Brand.test/").await;

    let short_url = body["shortUrl"].as_str().unwrap();
    assert!(short_url.starts_with(&format!("http://{BRAND}/")), "{short_url}");

    let stored = app.find_link("s1", &code_of(&body["shortUrl"])).await;
    assert_eq!(stored["domain"], format!("http://{BRAND}"));
    assert_eq!(stored["fullShortUrl"], short_url);
}

#[tokio::test]
async fn test_invalid_custom_domain_is_rejected() {
    let app = spawn_app();

    for domain in ["brand.test/promo", "bad host", "user@brand.test"] {
        let response = app
            .server
            .post("/api/links")
            .json(&json!({
                "originalUrl": "https://example.com",
                "sessionId": "s1",
                "customDomain": domain,
            }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["error"]["message"],
            "Invalid custom domain"
        );
    }
}

#[tokio::test]
async fn test_branded_link_resolves_by_host() {
    let app = spawn_app();
    let code = code_of(&create_branded(&app, BRAND).await["shortUrl"]);

    let response = app
        .server
        .get(&format!("/{code}"))
        .add_header("Host", BRAND)
        .await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/spring-sale");
    assert_eq!(app.find_link("s1", &code).await["totalClicks"], 1);
}

#[tokio::test]
async fn test_branded_link_is_not_found_on_other_brand() {
    let app = spawn_app();
    let code = code_of(&create_branded(&app, BRAND).await["shortUrl"]);

    let response = app
        .server
        .get(&format!("/{code}"))
        .add_header("Host", "other.brand.test")
        .await;

    response.assert_status_not_found();
    assert_eq!(app.find_link("s1", &code).await["totalClicks"], 0);
}

#[tokio::test]
async fn test_platform_link_ignores_host() {
    let app = spawn_app();
    let code = code_of(
        &app.create_simple_link("s1", "https://example.com")
            .await["shortUrl"],
    );

    app.server
        .get(&format!("/{code}"))
        .add_header("Host", "10.0.0.5:3000")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_alias_rename_keeps_custom_domain() {
    let app = spawn_app();
    create_branded(&app, BRAND).await;
    let id = app.list_links("s1").await[0]["id"].as_i64().unwrap();

    let response = app
        .server
        .put("/api/links")
        .add_query_param("id", id)
        .add_query_param("sessionId", "s1")
        .json(&json!({ "customAlias": "spring" }))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["fullShortUrl"],
        format!("http://{BRAND}/spring")
    );
}
