use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::{get, post},
};
use http_body_util::BodyExt;
use podserver::{LoggingOptions, Server, ServerBuilder};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn json_route_is_served() {
    let mut server = Server::new("Test", "http://localhost", 0);
    server
        .add_route("/info", || async { json!({"name": "PodCraft"}) })
        .await;

    let response = server
        .router()
        .await
        .oneshot(Request::get("/info").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "PodCraft");
}

#[tokio::test]
async fn sub_routers_are_nested_or_merged() {
    let mut server = Server::new("Test", "http://localhost", 0);
    server
        .add_router("/api/things", Router::new().route("/", get(|| async { "nested" })))
        .await;
    server
        .add_router("/", Router::new().route("/generate", get(|| async { "merged" })))
        .await;

    let router = server.router().await;

    let nested = router
        .clone()
        .oneshot(Request::get("/api/things").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(nested.status(), StatusCode::OK);

    let merged = router
        .oneshot(Request::get("/generate").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(merged.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let mut server = ServerBuilder::new("Test", "http://localhost", 0)
        .body_limit(16)
        .build();
    server
        .add_router(
            "/",
            Router::new().route("/echo", post(|Json(v): Json<Value>| async move { Json(v) })),
        )
        .await;

    let payload = json!({"content": "x".repeat(64)}).to_string();
    let response = server
        .router()
        .await
        .oneshot(
            Request::post("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_origin_is_echoed() {
    let mut server = ServerBuilder::new("Test", "http://localhost", 0)
        .cors_origin("http://localhost:5173")
        .build();
    server.add_route("/info", || async { json!({}) }).await;

    let response = server
        .router()
        .await
        .oneshot(
            Request::get("/info")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn log_setup_changes_the_level() {
    let mut server = Server::new("Test", "http://localhost", 0);
    server.init_logging(LoggingOptions::default()).await;
    let router = server.router().await;

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/logs/log_setup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"level":"debug"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["current_level"], "DEBUG");

    let response = router
        .oneshot(
            Request::post("/api/logs/log_setup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"level":"loud"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
