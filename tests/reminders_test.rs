//! Integration tests for the reminder sweep against a mocked Bot API

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reclin_bot::reminders;
use reclin_bot::reminders::scheduler::{run_check_cycle, ReminderPolicy};
use reclin_bot::storage::db::{self, Registration};
use reclin_bot::storage::{create_pool, get_connection, DbPool};
use teloxide::prelude::*;

const COMMUNITY_CHAT: ChatId = ChatId(-1001234567890);

struct ReminderTest {
    _dir: TempDir,
    mock_server: MockServer,
    bot: Bot,
    db_pool: Arc<DbPool>,
}

impl ReminderTest {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let bot = Bot::new("test_token_12345:ABCDEF")
            .set_api_url(mock_server.uri().parse().unwrap());

        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("test.sqlite");
        let db_pool =
            Arc::new(create_pool(path.to_str().unwrap()).expect("Failed to create test database"));

        Self {
            _dir: dir,
            mock_server,
            bot,
            db_pool,
        }
    }

    fn add_stub_with_due_check(&self, telegram_id: i64) {
        let conn = get_connection(&self.db_pool).unwrap();
        db::upsert_stub(&conn, telegram_id, None, "https://t.me/+stub").unwrap();
        reminders::db::schedule_check(&conn, telegram_id, Utc::now() - Duration::hours(1)).unwrap();
    }

    fn pending_checks(&self) -> i64 {
        let conn = get_connection(&self.db_pool).unwrap();
        reminders::db::count_pending(&conn).unwrap()
    }

    async fn mock_member_status(&self, status: &str) {
        let response = json!({
            "ok": true,
            "result": {
                "status": status,
                "user": {
                    "id": 42,
                    "is_bot": false,
                    "first_name": "Test"
                }
            }
        });

        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/getchatmember"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.mock_server)
            .await;
    }

    async fn mock_moderation_calls(&self) {
        let ok_true = json!({ "ok": true, "result": true });

        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/banchatmember"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_true.clone()))
            .mount(&self.mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/unbanchatmember"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_true))
            .mount(&self.mock_server)
            .await;
    }

    async fn mock_send_message(&self) {
        let response = json!({
            "ok": true,
            "result": {
                "message_id": 42,
                "from": {
                    "id": 987654321,
                    "is_bot": true,
                    "first_name": "TestBot"
                },
                "chat": {
                    "id": 42,
                    "first_name": "Test",
                    "type": "private"
                },
                "date": 1735992000,
                "text": "reminder"
            }
        });

        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/sendmessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.mock_server)
            .await;
    }

    async fn calls_matching(&self, fragment: &str) -> usize {
        let fragment = fragment.to_lowercase();
        self.mock_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|req| req.url.path().to_lowercase().contains(&fragment))
            .count()
    }
}

#[tokio::test]
#[serial]
async fn kick_policy_removes_the_user_and_drops_the_check() {
    let t = ReminderTest::new().await;
    t.add_stub_with_due_check(42);

    t.mock_member_status("member").await;
    t.mock_moderation_calls().await;
    t.mock_send_message().await;

    run_check_cycle(
        &t.bot,
        &t.db_pool,
        COMMUNITY_CHAT,
        ReminderPolicy::Kick,
        Duration::days(5),
    )
    .await
    .unwrap();

    assert_eq!(t.pending_checks(), 0);
    assert_eq!(t.calls_matching("banchatmember").await, 2); // ban + unban
    assert_eq!(t.calls_matching("sendmessage").await, 1);
}

#[tokio::test]
#[serial]
async fn kick_policy_skips_users_who_already_left() {
    let t = ReminderTest::new().await;
    t.add_stub_with_due_check(42);

    t.mock_member_status("left").await;

    run_check_cycle(
        &t.bot,
        &t.db_pool,
        COMMUNITY_CHAT,
        ReminderPolicy::Kick,
        Duration::days(5),
    )
    .await
    .unwrap();

    // The check is consumed without any moderation calls
    assert_eq!(t.pending_checks(), 0);
    assert_eq!(t.calls_matching("banchatmember").await, 0);
}

#[tokio::test]
#[serial]
async fn remind_policy_messages_the_user_and_reschedules() {
    let t = ReminderTest::new().await;
    t.add_stub_with_due_check(42);

    t.mock_send_message().await;

    run_check_cycle(
        &t.bot,
        &t.db_pool,
        COMMUNITY_CHAT,
        ReminderPolicy::Remind,
        Duration::days(5),
    )
    .await
    .unwrap();

    assert_eq!(t.calls_matching("sendmessage").await, 1);

    // Still exactly one check, pushed past now
    assert_eq!(t.pending_checks(), 1);
    let conn = get_connection(&t.db_pool).unwrap();
    let due_now = reminders::db::due_checks(&conn, Utc::now()).unwrap();
    assert!(due_now.is_empty());
}

#[tokio::test]
#[serial]
async fn complete_profile_drops_the_check_without_any_api_calls() {
    let t = ReminderTest::new().await;

    {
        let conn = get_connection(&t.db_pool).unwrap();
        db::upsert_registration(
            &conn,
            &Registration {
                telegram_id: 42,
                username: Some("doc"),
                fio: "Иванов И.И.",
                specialization: "терапевт",
                email: None,
                invite_link: "https://t.me/+done",
            },
        )
        .unwrap();
        reminders::db::schedule_check(&conn, 42, Utc::now() - Duration::hours(1)).unwrap();
    }

    run_check_cycle(
        &t.bot,
        &t.db_pool,
        COMMUNITY_CHAT,
        ReminderPolicy::Kick,
        Duration::days(5),
    )
    .await
    .unwrap();

    assert_eq!(t.pending_checks(), 0);
    assert!(t.mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn telegram_errors_do_not_abort_the_cycle() {
    let t = ReminderTest::new().await;
    t.add_stub_with_due_check(42);

    // No mocks mounted: every API call fails with 404. The cycle must still
    // finish and consume the check (best-effort semantics).
    run_check_cycle(
        &t.bot,
        &t.db_pool,
        COMMUNITY_CHAT,
        ReminderPolicy::Kick,
        Duration::days(5),
    )
    .await
    .unwrap();

    assert_eq!(t.pending_checks(), 0);
}

#[tokio::test]
#[serial]
async fn a_vanished_row_consumes_the_check() {
    let t = ReminderTest::new().await;

    {
        let conn = get_connection(&t.db_pool).unwrap();
        // A check without a matching user row
        reminders::db::schedule_check(&conn, 77, Utc::now() - Duration::hours(1)).unwrap();
    }

    run_check_cycle(
        &t.bot,
        &t.db_pool,
        COMMUNITY_CHAT,
        ReminderPolicy::Remind,
        Duration::days(5),
    )
    .await
    .unwrap();

    assert_eq!(t.pending_checks(), 0);
    assert!(t.mock_server.received_requests().await.unwrap().is_empty());
}
