mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::*;
use http_body_util::BodyExt;
use podgen::GenerationExt;
use podserver::Server;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower::ServiceExt;

async fn router_for(h: &Harness) -> Router {
    let mut server = Server::new("Test", "http://localhost", 0);
    server.init_generation(h.pipeline.clone()).await.unwrap();
    server.router().await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn generate_then_poll_until_complete() {
    let h = harness(FakeText::default(), FakeSpeech::default(), FakeImage::default()).await;
    let router = router_for(&h).await;

    let (status, body) = send(
        &router,
        post_json(
            "/generate",
            json!({"files": [pdf_base64()], "mode": "summaritive", "style": "debate"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["style"], "debate");
    assert_eq!(body["settings_used"]["host_name"], "Debater A");
    let podcast_id = body["podcast_id"].as_str().unwrap().to_string();

    wait_terminal(&h.pipeline, &podcast_id).await;

    let (status, body) = send(
        &router,
        Request::get(format!("/api/audio-progress/{}", podcast_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "complete", "step": "finished", "progress": 100, "message": "Podcast ready"})
    );
}

#[tokio::test]
async fn invalid_requests_are_400() {
    let h = harness(FakeText::default(), FakeSpeech::default(), FakeImage::default()).await;
    let router = router_for(&h).await;

    for body in [
        json!({"mode": "summaritive"}),
        json!({"content": "Some text", "style": "opera"}),
        json!({"content": "Some text", "mode": "extractive"}),
        json!({"files": ["bm90IGEgcGRm"]}),
        json!({"content": "Some text", "speakers": 9}),
    ] {
        let (status, response) = send(&router, post_json("/generate", body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(response["error"], "Invalid request");
        assert!(response["message"].is_string());
    }

    let (status, response) = send(
        &router,
        Request::post("/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Invalid request");
}

#[tokio::test]
async fn text_service_failure_is_502() {
    let text = FakeText {
        fail_script: true,
        ..Default::default()
    };
    let h = harness(text, FakeSpeech::default(), FakeImage::default()).await;
    let router = router_for(&h).await;

    let (status, body) = send(
        &router,
        post_json("/generate", json!({"content": "Tides and the moon"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to generate script");
}

#[tokio::test]
async fn unknown_progress_is_404_json() {
    let h = harness(FakeText::default(), FakeSpeech::default(), FakeImage::default()).await;
    let router = router_for(&h).await;

    let (status, body) = send(
        &router,
        Request::get("/api/audio-progress/unknown")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn audio_and_cover_endpoints() {
    let h = harness(FakeText::default(), FakeSpeech::default(), FakeImage::default()).await;
    let router = router_for(&h).await;
    let podcast = h
        .library
        .insert(podmodel::Podcast::from_script(
            "Bees",
            podmodel::PodcastFormat::Educational,
            "Teacher: Bees dance.",
        ))
        .await
        .unwrap();

    let (status, body) = send(
        &router,
        post_json(
            "/api/generate-audio",
            json!({"podcast_id": podcast.id, "script": "Teacher: Bees dance.\n\nStudent: Why?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["podcast_id"], podcast.id.as_str());
    assert!(body["audioUrl"].as_str().unwrap().starts_with("/static/audio/"));

    let (status, body) = send(
        &router,
        post_json("/api/generate-audio", json!({"podcast_id": podcast.id, "script": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Script is required");

    let (status, body) = send(
        &router,
        post_json("/api/generate-cover", json!({"podcast_id": podcast.id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["cover_url"].as_str().unwrap().starts_with("/static/covers/"));
    assert_eq!(body["podcast"]["title"], "Bees");

    let (status, _) = send(
        &router,
        post_json("/api/generate-cover", json!({"podcast_id": "ghost", "prompt": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_for_a_running_podcast_are_409() {
    let gate = Arc::new(Semaphore::new(0));
    let speech = FakeSpeech {
        gate: Some(gate.clone()),
        ..Default::default()
    };
    let h = harness(FakeText::default(), speech, FakeImage::default()).await;
    let router = router_for(&h).await;

    let (status, body) = send(
        &router,
        post_json("/generate", json!({"content": "Octopus anatomy"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let podcast_id = body["podcast_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        post_json(
            "/api/generate-audio",
            json!({"podcast_id": podcast_id, "script": SCRIPT}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Generation in progress");

    let (status, _) = send(
        &router,
        post_json(
            "/api/generate-cover",
            json!({"podcast_id": podcast_id, "prompt": "An octopus"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    gate.add_permits(3);
    wait_terminal(&h.pipeline, &podcast_id).await;

    let (status, _) = send(
        &router,
        post_json(
            "/api/generate-cover",
            json!({"podcast_id": podcast_id, "prompt": "An octopus"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
