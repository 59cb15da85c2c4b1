mod common;

use common::spawn_app;
use serde_json::Value;

#[tokio::test]
async fn test_health_endpoint_success() {
    let app = spawn_app();

    let response = app.server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["store"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["message"], "Disabled");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let app = spawn_app();

    let json = app.server.get("/health").await.json::<Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json.get("checks").is_some());
}
