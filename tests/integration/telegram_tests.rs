use super::*;
use quickdeal_watcher::plugins::notifiers::telegram::{MAX_MESSAGE_CHARS, TelegramNotifier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEND_PATH: &str = "/bot123456:TEST-TOKEN/sendMessage";

fn notifier_for(server: &MockServer) -> TelegramNotifier {
    TelegramNotifier::new(get_test_config(&server.uri(), &["201014"]).telegram).expect("client builds")
}

fn sent_texts(requests: &[wiremock::Request]) -> Vec<String> {
    requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).expect("json body");
            body["text"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_send_message_payload() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(body_partial_json(json!({
            "chat_id": "-1001234567890",
            "text": "*hello*",
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier_for(&server)
        .notify(&OutboundMessage::markdown("*hello*"))
        .await?;

    assert_eq!(result.parts_sent, 1);
    assert_eq!(result.message_ids, vec![7]);

    Ok(())
}

#[tokio::test]
async fn test_long_message_is_split_in_order() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 1 }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let line = "x".repeat(100);
    let text: String = (0..60).map(|i| format!("{:02} {}", i, line)).collect::<Vec<_>>().join("\n");
    assert!(text.chars().count() > MAX_MESSAGE_CHARS);

    let result = notifier_for(&server).notify(&OutboundMessage::markdown(text.clone())).await?;
    assert_eq!(result.parts_sent, 2);

    let requests = server.received_requests().await.unwrap_or_default();
    let parts = sent_texts(&requests);
    assert_eq!(parts.len(), 2);
    assert!(parts.iter().all(|p| p.chars().count() <= MAX_MESSAGE_CHARS));
    assert!(parts[0].starts_with("00 "));
    assert_eq!(parts.join("\n"), text);

    Ok(())
}

#[tokio::test]
async fn test_rejected_status_is_delivery_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "description": "Bad Request: can't parse entities"
        })))
        .mount(&server)
        .await;

    let result = notifier_for(&server).notify(&OutboundMessage::markdown("*broken")).await;
    match result {
        Err(DeliveryError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("can't parse entities"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ok_false_is_delivery_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;

    let result = notifier_for(&server).notify(&OutboundMessage::markdown("hi")).await;
    match result {
        Err(DeliveryError::Rejected { body, .. }) => assert!(body.contains("blocked")),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_hung_send_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true, "result": { "message_id": 1 } }))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let result = notifier_for(&server).notify(&OutboundMessage::markdown("hi")).await;

    match result {
        Err(DeliveryError::Transport(e)) => assert!(e.is_timeout()),
        other => panic!("expected a transport timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(8));
}
