//! Mail API and AI endpoint clients against mock servers

use assert_matches::assert_matches;
use serde_json::json;
use skiclub::config::settings::{AiConfig, OAuth2MailConfig};
use skiclub::services::ai::AiService;
use skiclub::services::email::{EmailSender, OAuth2EmailSender, OutgoingEmail};
use skiclub::utils::errors::{AiError, EmailError, SkiClubError};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mail_config(server: &MockServer) -> OAuth2MailConfig {
    OAuth2MailConfig {
        token_url: format!("{}/oauth2/token", server.uri()),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        scope: "https://mail.example/.default".to_string(),
        send_url: format!("{}/users/{{sender}}/sendMail", server.uri()),
    }
}

fn email() -> OutgoingEmail {
    OutgoingEmail {
        to: "rodzic@example.com".to_string(),
        to_name: Some("Anna Nowak".to_string()),
        subject: "Przypomnienie o płatności".to_string(),
        html_body: "<p>Rata 1</p>".to_string(),
    }
}

fn ai_config(server: &MockServer, api_key: Option<&str>) -> AiConfig {
    AiConfig {
        api_url: format!("{}/v1/chat/completions", server.uri()),
        api_key: api_key.map(str::to_string),
        model: "test-model".to_string(),
        timeout_seconds: 5,
        requests_per_minute: 10,
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
}

#[tokio::test]
async fn test_oauth2_sender_reuses_cached_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"/sendMail$"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({
            "message": { "subject": "Przypomnienie o płatności" }
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&server)
        .await;

    let sender = OAuth2EmailSender::new(mail_config(&server), "biuro@skiclub.local", "Klub Narciarski");

    sender.send(&email()).await.unwrap();
    sender.send(&email()).await.unwrap();
    assert_eq!(sender.name(), "oauth2");
}

#[tokio::test]
async fn test_oauth2_sender_reports_token_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let sender = OAuth2EmailSender::new(mail_config(&server), "biuro@skiclub.local", "Klub Narciarski");

    let result = sender.send(&email()).await;
    assert_matches!(result, Err(EmailError::Authentication(msg)) if msg.contains("invalid_client"));
}

#[tokio::test]
async fn test_oauth2_sender_reports_api_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok-1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/sendMail$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("mailbox unavailable"))
        .mount(&server)
        .await;

    let sender = OAuth2EmailSender::new(mail_config(&server), "biuro@skiclub.local", "Klub Narciarski");

    assert_matches!(sender.send(&email()).await, Err(EmailError::Api(_)));
}

#[tokio::test]
async fn test_ai_parses_fenced_reply() {
    let server = MockServer::start().await;
    let reply = "```json\n{\"title\": \"Zakopane 2027\", \"departure_location\": \"Kraków\", \
        \"installments\": [{\"number\": 1, \"amount\": 800, \"currency\": \"PLN\", \"due_date\": \"2026-12-01\"}]}\n```";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let ai = AiService::new(ai_config(&server, Some("test-key"))).unwrap();
    assert!(ai.is_enabled());

    let parsed = ai.parse_trip("Wyjazd do Zakopanego, zbiórka w Krakowie").await.unwrap();
    assert_eq!(parsed.title.as_deref(), Some("Zakopane 2027"));
    assert_eq!(parsed.departure_location.as_deref(), Some("Kraków"));
    assert_eq!(parsed.installments.len(), 1);
    assert_eq!(parsed.installments[0].amount, Some(800.0));
    assert!(parsed.season_passes.is_empty());
}

#[tokio::test]
async fn test_ai_server_error_is_request_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ai = AiService::new(ai_config(&server, Some("test-key"))).unwrap();

    let result = ai.parse_trip("Wyjazd").await;
    assert_matches!(result, Err(SkiClubError::Ai(AiError::RequestFailed(_))));
}

#[tokio::test]
async fn test_ai_prose_reply_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Sorry, I cannot read that.")))
        .mount(&server)
        .await;

    let ai = AiService::new(ai_config(&server, Some("test-key"))).unwrap();

    assert_matches!(
        ai.parse_trip("Wyjazd").await,
        Err(SkiClubError::Ai(AiError::InvalidResponse(_)))
    );
}

#[tokio::test]
async fn test_ai_without_key_is_not_configured() {
    let server = MockServer::start().await;

    let ai = AiService::new(ai_config(&server, None)).unwrap();
    assert!(!ai.is_enabled());

    assert_matches!(
        ai.parse_trip("Wyjazd").await,
        Err(SkiClubError::Ai(AiError::NotConfigured))
    );
}
