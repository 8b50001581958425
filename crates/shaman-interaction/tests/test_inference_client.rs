use std::time::Duration;

use serde_json::json;
use shaman_core::{ClientConfig, Credential, ShamanError, TaskHint};
use shaman_interaction::{InferenceClient, OcrOutcome, QuickAction};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "hf_test_token";
const CHAT_PATH: &str = "/models/microsoft/DialoGPT-medium";
const MATH_PATH: &str = "/models/google/flan-t5-base";
const OCR_PATH: &str = "/models/microsoft/trocr-base-handwritten";

fn client_for(server: &MockServer) -> InferenceClient {
    let config = ClientConfig {
        base_url: format!("{}/models/", server.uri()),
        ..ClientConfig::default()
    };
    InferenceClient::new(config, Credential::parse(TOKEN).unwrap()).unwrap()
}

fn generated(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": text }]))
}

#[tokio::test]
async fn test_math_prompt_uses_quantitative_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MATH_PATH))
        .and(header("authorization", "Bearer hf_test_token"))
        .and(body_partial_json(json!({
            "inputs": "Реши математическую задачу: реши уравнение x^2 = 4",
            "parameters": { "max_new_tokens": 200, "temperature": 0.3 }
        })))
        .respond_with(generated("x = 2 или x = -2"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let answer = client.submit_prompt("реши уравнение x^2 = 4").await.unwrap();

    assert_eq!(answer, "x = 2 или x = -2");
    assert!(client.transcript().is_empty(), "math answers stay out of the transcript");
    assert_eq!(client.context(), "");
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_chat_prompt_uses_conversational_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({
            "inputs": "User: Привет!\nAI:",
            "parameters": { "max_new_tokens": 150, "do_sample": true, "return_full_text": false }
        })))
        .respond_with(generated("Здравствуй!"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let answer = client.submit_prompt("Привет!").await.unwrap();

    assert_eq!(answer, "Здравствуй!");
    assert_eq!(client.transcript().len(), 1);
    assert_eq!(client.transcript()[0].prompt, "Привет!");
    assert_eq!(client.transcript()[0].response, "Здравствуй!");
}

#[tokio::test]
async fn test_context_is_threaded_and_echo_stripped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({ "inputs": "User: hi\nAI:" })))
        .respond_with(generated("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let second_input = "User: hi\nAI: hello\nUser: how are you?\nAI:";
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({ "inputs": second_input })))
        .respond_with(generated(&format!("{second_input} fine, thanks")))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.submit_prompt("hi").await.unwrap();
    let answer = client.submit_prompt("how are you?").await.unwrap();

    assert_eq!(answer, "fine, thanks");
    assert_eq!(client.transcript().len(), 2);
    assert_eq!(
        client.context(),
        "User: hi\nAI: hello\nUser: how are you?\nAI: fine, thanks\n"
    );
}

#[tokio::test]
async fn test_warming_up_leaves_transcript_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(generated("hello"))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.submit_prompt("hi").await.unwrap();
    let context_before = client.context().to_string();

    server.reset().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Model microsoft/DialoGPT-medium is currently loading",
            "estimated_time": 31.0
        })))
        .mount(&server)
        .await;

    let err = client.submit_prompt("still there?").await.unwrap_err();

    assert_eq!(
        err,
        ShamanError::ModelWarmingUp {
            retry_after: Duration::from_secs(31)
        }
    );
    assert!(err.is_retryable());
    assert_eq!(client.transcript().len(), 1);
    assert_eq!(client.context(), context_before);
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_warming_up_without_estimate_uses_configured_delay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = client.submit_prompt("посчитай 2+2").await.unwrap_err();

    assert_eq!(
        err,
        ShamanError::ModelWarmingUp {
            retry_after: Duration::from_secs(20)
        }
    );
}

#[tokio::test]
async fn test_oversized_estimate_falls_back_to_configured_delay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "loading",
            "estimated_time": 1e30
        })))
        .mount(&server)
        .await;

    let expected = ShamanError::ModelWarmingUp {
        retry_after: Duration::from_secs(20),
    };
    let mut client = client_for(&server);

    assert_eq!(client.submit_prompt("hi").await.unwrap_err(), expected);
    assert_eq!(
        client.run_preset(QuickAction::Physics).await.unwrap_err(),
        expected
    );
    assert_eq!(client.check_connection().await.unwrap_err(), expected);
    assert!(client.transcript().is_empty());
}

#[tokio::test]
async fn test_math_answer_strips_echoed_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MATH_PATH))
        .respond_with(generated(
            "Реши математическую задачу: посчитай 2+2  Ответ: 4",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let answer = client.submit_prompt("посчитай 2+2").await.unwrap();

    assert_eq!(answer, "Ответ: 4");
}

#[tokio::test]
async fn test_unauthorized_yields_invalid_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = client.submit_prompt("hi").await.unwrap_err();

    assert_eq!(err, ShamanError::InvalidCredential);
    assert!(err.requires_new_credential());
    assert!(client.transcript().is_empty());
    assert_eq!(client.context(), "");
}

#[tokio::test]
async fn test_other_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = client.submit_prompt("hi").await.unwrap_err();

    assert_eq!(err, ShamanError::transport(500, "Internal Server Error"));
    assert!(client.transcript().is_empty());
}

#[tokio::test]
async fn test_unrecognized_shape_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "label": "POSITIVE" })))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = client.submit_prompt("hi").await.unwrap_err();

    assert!(matches!(err, ShamanError::UnrecognizedResponseShape(_)));
    assert!(client.transcript().is_empty());
}

#[tokio::test]
async fn test_bare_string_and_summary_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("plain answer")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MATH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "summary_text": "4" }])),
        )
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    assert_eq!(client.submit_prompt("hi").await.unwrap(), "plain answer");
    assert_eq!(client.submit_prompt("посчитай 2+2").await.unwrap(), "4");
}

#[tokio::test]
async fn test_reset_clears_context_for_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({ "inputs": "User: first\nAI:" })))
        .respond_with(generated("one"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({ "inputs": "User: second\nAI:" })))
        .respond_with(generated("two"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.submit_prompt("first").await.unwrap();
    client.reset_conversation();

    assert!(client.transcript().is_empty());
    assert_eq!(client.context(), "");

    assert_eq!(client.submit_prompt("second").await.unwrap(), "two");
    assert_eq!(client.transcript().len(), 1);
}

#[tokio::test]
async fn test_empty_prompt_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(generated("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    assert_eq!(
        client.submit_prompt("   ").await.unwrap_err(),
        ShamanError::EmptyPrompt
    );
}

#[tokio::test]
async fn test_explicit_hint_overrides_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(generated("let's chat about it"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let answer = client
        .submit_prompt_with_hint("теорема Пифагора", TaskHint::Conversational)
        .await
        .unwrap();

    assert_eq!(answer, "let's chat about it");
    assert_eq!(client.transcript().len(), 1);
}

#[tokio::test]
async fn test_ocr_recognized_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OCR_PATH))
        .and(header("authorization", "Bearer hf_test_token"))
        .and(body_string_contains("fake-image-bytes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "x + 1 = 2" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client
        .recognize_image_text(b"fake-image-bytes".to_vec())
        .await
        .unwrap();

    assert_eq!(outcome, OcrOutcome::Recognized("x + 1 = 2".to_string()));
}

#[tokio::test]
async fn test_ocr_empty_text_is_not_recognized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OCR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client.recognize_image_text(b"png".to_vec()).await.unwrap();

    assert_eq!(outcome, OcrOutcome::NotRecognized);
}

#[tokio::test]
async fn test_ocr_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OCR_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.recognize_image_text(b"png".to_vec()).await.unwrap_err();

    assert_eq!(err, ShamanError::transport(500, "boom"));
}

#[tokio::test]
async fn test_ocr_rejects_empty_image() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    assert_eq!(
        client.recognize_image_text(Vec::new()).await.unwrap_err(),
        ShamanError::EmptyImage
    );
}

#[tokio::test]
async fn test_check_connection_accepts_any_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(json!({
            "inputs": "Привет! Ответь коротко.",
            "parameters": { "max_new_tokens": 20 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "warnings": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.check_connection().await.unwrap();
    assert!(client.transcript().is_empty());
}

#[tokio::test]
async fn test_check_connection_reports_bad_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.check_connection().await.unwrap_err(),
        ShamanError::InvalidCredential
    );
}

#[tokio::test]
async fn test_quick_action_bypasses_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MATH_PATH))
        .and(body_partial_json(json!({
            "parameters": { "max_new_tokens": 200, "temperature": 0.3 }
        })))
        .respond_with(generated("x = 2, x = 3"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let answer = client.run_preset(QuickAction::ExampleMath).await.unwrap();

    assert_eq!(answer, "x = 2, x = 3");
    assert!(client.transcript().is_empty());
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_connection_failure_has_no_status() {
    let config = ClientConfig {
        base_url: "http://127.0.0.1:1/models/".to_string(),
        ..ClientConfig::default()
    };
    let mut client = InferenceClient::new(config, Credential::parse(TOKEN).unwrap()).unwrap();

    let err = client.submit_prompt("hi").await.unwrap_err();
    assert!(matches!(err, ShamanError::Transport { status: None, .. }));
    assert!(client.transcript().is_empty());
}
