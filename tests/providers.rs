//! Provider adapters against a mock HTTP server: request shape, response
//! decoding and error mapping. Also covers URL inputs.

use docscan::{
    analyze_batch, analyze_inputs, AnalysisConfig, ClaudeAnalyzer, DocumentError, DocumentFile,
    GptAnalyzer, VisionAnalyzer,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([250, 250, 240])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn passport() -> Vec<(String, DocumentFile)> {
    vec![("passportFile".to_string(), DocumentFile::new(png_bytes(), "image/png"))]
}

fn claude_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn"
    }))
}

fn gpt_reply(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    }))
}

// ── Claude ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn claude_request_carries_key_version_and_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-anthropic"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 1024
        })))
        .respond_with(claude_reply(
            "```json\n{\"firstName\": \" Jean \", \"passportNumber\": \"OB1234567\", \"birthPlace\": \"\"}\n```",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = AnalysisConfig::builder()
        .anthropic_api_key("test-anthropic")
        .anthropic_base_url(server.uri())
        .build()
        .unwrap();

    let response = analyze_batch(passport(), "claude", &config).await;

    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.merged_data["firstName"], "Jean");
    assert_eq!(response.merged_data["passportNumber"], "OB1234567");
    assert!(response.merged_data.get("birthPlace").is_none());

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let content = &body["messages"][0]["content"];
    assert_eq!(content[0]["type"], "image");
    assert_eq!(content[0]["source"]["media_type"], "image/jpeg");
    assert_eq!(content[1]["type"], "text");
    assert!(content[1]["text"].as_str().unwrap().contains("passportNumber"));
}

#[tokio::test]
async fn claude_http_error_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let analyzer = ClaudeAnalyzer::new("bad-key", &server.uri(), 5).unwrap();
    let err = analyzer.analyze("QUJD", "Extract").await.unwrap_err();
    match err {
        DocumentError::Provider { provider, detail } => {
            assert_eq!(provider, "anthropic");
            assert!(detail.contains("401"), "{detail}");
            assert!(detail.contains("invalid x-api-key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_skips_the_document_not_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let config = AnalysisConfig::builder()
        .anthropic_api_key("k")
        .anthropic_base_url(server.uri())
        .build()
        .unwrap();

    let response = analyze_batch(passport(), "claude", &config).await;
    assert!(response.success);
    assert!(response.results.is_empty());
}

// ── GPT ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn gpt_request_uses_bearer_auth_and_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-openai"))
        .and(body_partial_json(json!({ "model": "gpt-4o" })))
        .respond_with(gpt_reply(json!(
            "Here is the result:\n{\"lastName\":\"Mbala\",\"address\":{\"street\":\"\",\"city\":null}}"
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = AnalysisConfig::builder()
        .openai_api_key("test-openai")
        .openai_base_url(server.uri())
        .build()
        .unwrap();

    let response = analyze_batch(passport(), "gpt", &config).await;

    assert!(response.success);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.merged_data["lastName"], "Mbala");
    assert!(response.merged_data.get("address").is_none());

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("max_tokens").is_none());
    let content = &body["messages"][0]["content"];
    assert_eq!(content[0]["type"], "text");
    assert_eq!(content[1]["type"], "image_url");
    assert!(content[1]["image_url"]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,/9j/"));
}

#[tokio::test]
async fn gpt_null_content_is_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(gpt_reply(Value::Null))
        .mount(&server)
        .await;

    let analyzer = GptAnalyzer::new("k", &server.uri(), 5).unwrap();
    assert_eq!(analyzer.analyze("QUJD", "Extract").await.unwrap(), "");

    let config = AnalysisConfig::builder()
        .openai_api_key("k")
        .openai_base_url(server.uri())
        .build()
        .unwrap();
    let response = analyze_batch(passport(), "gpt", &config).await;
    assert!(response.success);
    assert!(response.results.is_empty());
}

// ── URL inputs ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn url_inputs_are_downloaded_and_broken_links_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads/4f1c"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes())
                .insert_header("Content-Type", "application/octet-stream"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uploads/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(claude_reply(r#"{"firstName":"Jean"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = AnalysisConfig::builder()
        .anthropic_api_key("k")
        .anthropic_base_url(server.uri())
        .build()
        .unwrap();

    let inputs = vec![
        ("passportFile".to_string(), format!("{}/uploads/4f1c", server.uri())),
        ("birthCertificateFile".to_string(), format!("{}/uploads/gone", server.uri())),
    ];
    let response = analyze_inputs(&inputs, "claude", &config).await;

    assert!(response.success);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].document_type, "passportFile");
}
