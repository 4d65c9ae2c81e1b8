//! Integration tests for the broadcast fan-out against a mocked Bot API

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reclin_bot::telegram::broadcast::{send_broadcast, BroadcastContent};
use teloxide::Bot;

fn sent_message_response() -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 42,
            "from": {
                "id": 987654321,
                "is_bot": true,
                "first_name": "TestBot",
                "username": "test_bot"
            },
            "chat": {
                "id": 123456789,
                "first_name": "Test",
                "type": "private"
            },
            "date": 1735992000,
            "text": "hello"
        }
    })
}

fn chat_not_found_response() -> serde_json::Value {
    json!({
        "ok": false,
        "error_code": 400,
        "description": "Bad Request: chat not found"
    })
}

async fn mock_bot() -> (MockServer, Bot) {
    let mock_server = MockServer::start().await;
    let bot =
        Bot::new("test_token_12345:ABCDEF").set_api_url(mock_server.uri().parse().unwrap());
    (mock_server, bot)
}

fn text_content(text: &str) -> BroadcastContent {
    BroadcastContent {
        caption: text.to_string(),
        caption_entities: Vec::new(),
        attachments: Vec::new(),
    }
}

#[tokio::test]
async fn every_recipient_is_counted_exactly_once() {
    let (mock_server, bot) = mock_bot().await;

    // Recipient 3 rejects the message, everyone else accepts
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bot[^/]+/sendmessage"))
        .and(body_partial_json(json!({ "chat_id": 3 })))
        .respond_with(ResponseTemplate::new(400).set_body_json(chat_not_found_response()))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex("(?i)/bot[^/]+/sendmessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message_response()))
        .mount(&mock_server)
        .await;

    let tg_ids = [1, 2, 3, 4];
    let (sent, failed) = send_broadcast(&bot, &tg_ids, &text_content("Анонс эфира")).await;

    assert_eq!(sent, 3);
    assert_eq!(failed, 1);
    assert_eq!((sent + failed) as usize, tg_ids.len());

    // One API call per recipient, failures are not retried
    let calls = mock_server.received_requests().await.unwrap().len();
    assert_eq!(calls, tg_ids.len());
}

#[tokio::test]
async fn failures_do_not_abort_the_remaining_sends() {
    let (mock_server, bot) = mock_bot().await;

    // The first recipient fails, the rest must still receive the message
    Mock::given(method("POST"))
        .and(path_regex("(?i)/bot[^/]+/sendmessage"))
        .and(body_partial_json(json!({ "chat_id": 1 })))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex("(?i)/bot[^/]+/sendmessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message_response()))
        .mount(&mock_server)
        .await;

    let (sent, failed) = send_broadcast(&bot, &[1, 2, 3], &text_content("test")).await;

    assert_eq!(sent, 2);
    assert_eq!(failed, 1);
}

#[tokio::test]
async fn empty_recipient_list_sends_nothing() {
    let (mock_server, bot) = mock_bot().await;

    let (sent, failed) = send_broadcast(&bot, &[], &text_content("test")).await;

    assert_eq!(sent, 0);
    assert_eq!(failed, 0);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
