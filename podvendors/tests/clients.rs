use mockito::Matcher;
use podvendors::{
    AnthropicClient, CartesiaClient, HuggingFaceClient, ImageGenerator, ImageSettings,
    LlmSettings, SpeechSynthesizer, TextGenerator, TextRequest, TtsSettings, VendorError,
};
use serde_json::json;

#[tokio::test]
async fn anthropic_reply_concatenates_text_blocks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "model": "claude-3-7-sonnet-20250219",
            "system": "You write scripts.",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "content": [
                    {"type": "text", "text": "Title: Tides\n"},
                    {"type": "text", "text": "Host: Welcome!"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut settings = LlmSettings::with_api_key("test-key");
    settings.base_url = server.url();
    let client = AnthropicClient::new(settings).unwrap();

    let reply = client
        .generate(TextRequest::new("You write scripts.", "Explain tides."))
        .await
        .unwrap();

    assert_eq!(reply, "Title: Tides\nHost: Welcome!");
    mock.assert_async().await;
}

#[tokio::test]
async fn anthropic_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(529)
        .with_body(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
        .create_async()
        .await;

    let mut settings = LlmSettings::with_api_key("test-key");
    settings.base_url = server.url();
    let client = AnthropicClient::new(settings).unwrap();

    let err = client
        .generate(TextRequest::new("s", "p"))
        .await
        .unwrap_err();

    match err {
        VendorError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn anthropic_empty_content_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(r#"{"content": []}"#)
        .create_async()
        .await;

    let mut settings = LlmSettings::with_api_key("test-key");
    settings.base_url = server.url();
    let client = AnthropicClient::new(settings).unwrap();

    let err = client.generate(TextRequest::new("s", "p")).await.unwrap_err();
    assert!(matches!(err, VendorError::EmptyResponse(_)));
}

#[tokio::test]
async fn cartesia_sends_voice_and_wav_format() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/tts/bytes")
        .match_header("x-api-key", "tts-key")
        .match_header("cartesia-version", "2024-06-10")
        .match_body(Matcher::PartialJson(json!({
            "model_id": "sonic-2",
            "transcript": "Hello there",
            "voice": {"mode": "id", "id": "voice-1"},
            "output_format": {"container": "wav", "sample_rate": 44100, "encoding": "pcm_s16le"}
        })))
        .with_status(200)
        .with_header("content-type", "audio/wav")
        .with_body(b"RIFF....WAVE")
        .create_async()
        .await;

    let mut settings = TtsSettings::with_api_key("tts-key");
    settings.base_url = server.url();
    let client = CartesiaClient::new(settings).unwrap();

    let bytes = client.synthesize("Hello there", "voice-1").await.unwrap();
    assert_eq!(bytes, b"RIFF....WAVE");
    mock.assert_async().await;
}

#[tokio::test]
async fn cartesia_credit_limit_is_recognised() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/tts/bytes")
        .with_status(402)
        .with_body(r#"{"error": "Credit limit reached"}"#)
        .create_async()
        .await;

    let mut settings = TtsSettings::with_api_key("tts-key");
    settings.base_url = server.url();
    let client = CartesiaClient::new(settings).unwrap();

    let err = client.synthesize("Hello", "voice-1").await.unwrap_err();
    assert!(err.is_credit_limit());
}

#[tokio::test]
async fn huggingface_uses_bearer_token_and_content_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/sdxl")
        .match_header("authorization", "Bearer hf-token")
        .match_body(Matcher::PartialJson(json!({
            "inputs": "a lighthouse at dusk",
            "parameters": {"guidance_scale": 7.5, "num_inference_steps": 50}
        })))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body([0xFFu8, 0xD8, 0xFF, 0xE0])
        .create_async()
        .await;

    let mut settings = ImageSettings::with_api_key("hf-token");
    settings.url = format!("{}/models/sdxl", server.url());
    let client = HuggingFaceClient::new(settings).unwrap();

    let image = client.generate_image("a lighthouse at dusk").await.unwrap();
    assert_eq!(image.extension, "jpg");
    assert_eq!(image.bytes.len(), 4);
    mock.assert_async().await;
}
