mod common;

use axum::http::StatusCode;
use common::{BASE_URL, IPHONE_UA, code_of, create_test_state, spawn_app, test_config};
use linkly::application::services::{ClickContext, CreateLink};
use linkly::domain::entities::ExpirationPolicy;
use serde_json::{Value, json};
use std::sync::Arc;

#[tokio::test]
async fn test_click_returns_destination_and_counts() {
    let app = spawn_app();
    let link = app.create_simple_link("s1", "https://example.com/landing").await;
    let code = code_of(&link["shortUrl"]);

    let response = app.click(&code).await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "redirectTo": "https://example.com/landing" })
    );
    assert_eq!(app.find_link("s1", &code).await["totalClicks"], 1);
}

#[tokio::test]
async fn test_click_limit_of_one_allows_exactly_one_click() {
    let app = spawn_app();
    let link = app.create_simple_link("s1", "https://example.com").await;
    let code = code_of(&link["shortUrl"]);
    let id = app.find_link("s1", &code).await["id"].clone();

    app.server
        .patch("/api/links")
        .json(&json!({
            "id": id,
            "sessionId": "s1",
            "expirationType": "clicks",
            "expireAfterClicks": 1
        }))
        .await
        .assert_status_ok();

    let first = app.click(&code).await;
    first.assert_status_ok();
    assert_eq!(first.json::<Value>()["redirectTo"], "https://example.com");

    let second = app.click(&code).await;
    second.assert_status(StatusCode::GONE);

    let stored = app.find_link("s1", &code).await;
    assert_eq!(stored["totalClicks"], 1);
    assert_eq!(stored["status"], "expired");
}

#[tokio::test]
async fn test_click_on_past_datetime_link_is_gone_and_not_counted() {
    let app = spawn_app();
    let link = app
        .create_link(json!({
            "originalUrl": "https://example.com",
            "sessionId": "s1",
            "expirationType": "datetime",
            "expiresAt": "2001-09-09T01:46:40Z"
        }))
        .await;
    let code = code_of(&link["shortUrl"]);

    app.click(&code).await.assert_status(StatusCode::GONE);

    let stored = app.find_link("s1", &code).await;
    assert_eq!(stored["totalClicks"], 0);
    assert_eq!(stored["status"], "expired");
}

#[tokio::test]
async fn test_click_future_datetime_link_still_works() {
    let app = spawn_app();
    let link = app
        .create_link(json!({
            "originalUrl": "https://example.com",
            "sessionId": "s1",
            "expirationType": "datetime",
            "expiresAt": "2999-01-01T00:00:00Z"
        }))
        .await;

    app.click(&code_of(&link["shortUrl"]))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_click_unknown_code() {
    let app = spawn_app();

    let response = app.click("nope1234").await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_click_without_user_agent_is_recorded() {
    let app = spawn_app();
    let link = app.create_simple_link("s1", "https://example.com").await;
    let code = code_of(&link["shortUrl"]);

    app.server
        .get(&format!("/api/click/{code}"))
        .await
        .assert_status_ok();

    assert_eq!(app.find_link("s1", &code).await["totalClicks"], 1);
}

// ─── REDIRECT ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_redirect_is_temporary_and_counts() {
    let app = spawn_app();
    let link = app.create_simple_link("s1", "https://example.com/target").await;
    let code = code_of(&link["shortUrl"]);

    let response = app
        .server
        .get(&format!("/{code}"))
        .add_header("User-Agent", IPHONE_UA)
        .await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/target");
    assert_eq!(app.find_link("s1", &code).await["totalClicks"], 1);
}

#[tokio::test]
async fn test_redirect_expired_renders_gone_page() {
    let app = spawn_app();
    let link = app
        .create_link(json!({
            "originalUrl": "https://example.com",
            "sessionId": "s1",
            "expirationType": "datetime",
            "expiresAt": "2001-09-09T01:46:40Z"
        }))
        .await;
    let code = code_of(&link["shortUrl"]);

    let response = app.server.get(&format!("/{code}")).await;

    response.assert_status(StatusCode::GONE);
    let html = response.text();
    assert!(html.contains("expired"));
    assert!(html.contains(&code));
    assert!(html.contains(BASE_URL));
}

#[tokio::test]
async fn test_redirect_unknown_renders_not_found_page() {
    let app = spawn_app();

    let response = app.server.get("/missing-code").await;

    response.assert_status_not_found();
    assert!(response.text().contains("missing-code"));
}

// ─── CONCURRENCY ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clicks_are_all_counted() {
    let config = test_config();
    let state = create_test_state(&config, Default::default());
    let link = state
        .link_service
        .create(CreateLink {
            original_url: "https://example.com".to_string(),
            session_id: "s1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let clicks = 50;
    let mut tasks = Vec::with_capacity(clicks);
    for _ in 0..clicks {
        let service = Arc::clone(&state.click_service);
        let code = link.short_code.clone();
        tasks.push(tokio::spawn(async move {
            service.record(&code, ClickContext::default()).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = state.link_service.get_by_code(&link.short_code).await.unwrap();
    assert_eq!(stored.total_clicks, clicks as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clicks_never_exceed_limit() {
    let config = test_config();
    let state = create_test_state(&config, Default::default());
    let limit = 5;
    let link = state
        .link_service
        .create(CreateLink {
            original_url: "https://example.com".to_string(),
            session_id: "s1".to_string(),
            expiration: ExpirationPolicy::Clicks(limit),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..40 {
        let service = Arc::clone(&state.click_service);
        let code = link.short_code.clone();
        tasks.push(tokio::spawn(async move {
            service.record(&code, ClickContext::default()).await
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    let stored = state.link_service.get_by_code(&link.short_code).await.unwrap();
    assert_eq!(succeeded, limit);
    assert_eq!(stored.total_clicks, limit);
    assert!(stored.is_expired_at(chrono::Utc::now()));
}
