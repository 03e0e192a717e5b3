use super::*;
use crate::config::Config;
use crate::service::PdfService;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot


/// Helper to create a test PdfService instance wrapped in Arc
async fn create_test_service() -> (Arc<PdfService>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.upload_folder = dir.path().to_path_buf();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();

    let service = PdfService::new(config).await.unwrap();
    (Arc::new(service), dir)
}

fn test_app(service: &Arc<PdfService>) -> Router {
    create_router(service.clone(), service.config().clone())
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown() {
    let (service, _dir) = create_test_service().await;

    let handle = service.spawn_api_server();

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    service.shutdown().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (service, _dir) = create_test_service().await;
    let app = test_app(&service);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_enabled() {
    let (service, _dir) = create_test_service().await;

    let mut config = (*service.config).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

fn webhook_request(api_key: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    let builder = match api_key {
        Some(key) => builder.header("X-Api-Key", key),
        None => builder,
    };
    builder
        .body(Body::from(
            serde_json::json!({
                "title": "Flyer",
                "canva_link": "https://www.canva.com/design/ABC123"
            })
            .to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_authentication_guards_the_webhook() {
    let (service, _dir) = create_test_service().await;

    let mut config = (*service.config).clone();
    config.api.api_key = Some("test-secret-key".to_string());
    let app = create_router(service, Arc::new(config));

    // Webhook without API key should return 401
    let response = app.clone().oneshot(webhook_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Webhook with invalid API key should return 401
    let response = app
        .clone()
        .oneshot(webhook_request(Some("wrong-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Webhook with valid API key should generate
    let response = app
        .oneshot(webhook_request(Some("test-secret-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_download_status_and_health_stay_keyless() {
    let (service, _dir) = create_test_service().await;

    let mut config = (*service.config).clone();
    config.api.api_key = Some("test-secret-key".to_string());
    let app = create_router(service, Arc::new(config));

    // Generate with the key, then fetch everything else without it: a
    // customer following an emailed download link holds no credentials
    let response = app
        .clone()
        .oneshot(webhook_request(Some("test-secret-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let descriptor: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let filename = descriptor["filename"].as_str().unwrap();
    let file_id = descriptor["file_id"].as_str().unwrap();

    for uri in [
        format!("/download/{filename}"),
        format!("/status/{file_id}"),
        "/health".to_string(),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "{uri} must not require the API key"
        );
    }
}

#[tokio::test]
async fn test_authentication_disabled_by_default() {
    let (service, _dir) = create_test_service().await;
    let app = test_app(&service);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let (service, _dir) = create_test_service().await;
    let app = test_app(&service);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(json["info"]["title"], "pdfsmith REST API");

    let paths = json["paths"].as_object().unwrap();
    assert!(paths.contains_key("/webhook"));
    assert!(paths.contains_key("/download/{filename}"));
    assert!(paths.contains_key("/status/{file_id}"));
    assert!(paths.contains_key("/health"));
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (service, _dir) = create_test_service().await;

    let mut config = (*service.config).clone();
    config.api.swagger_ui = true;
    let app = create_router(service, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Swagger UI should be accessible when enabled"
    );
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (service, _dir) = create_test_service().await;

    let mut config = (*service.config).clone();
    config.api.swagger_ui = false;
    let app = create_router(service, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}
