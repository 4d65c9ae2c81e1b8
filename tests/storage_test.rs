//! Integration tests for the users table and the reminder checks

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use reclin_bot::reminders;
use reclin_bot::storage::db::{self, Registration};
use reclin_bot::storage::{create_pool, get_connection, DbPool};

fn test_pool() -> (TempDir, DbPool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("test.sqlite");
    let pool = create_pool(path.to_str().unwrap()).expect("Failed to create test database");
    (dir, pool)
}

fn registration<'a>(fio: &'a str, invite_link: &'a str) -> Registration<'a> {
    Registration {
        telegram_id: 42,
        username: Some("doc"),
        fio,
        specialization: "терапевт",
        email: Some("doc@example.com"),
        invite_link,
    }
}

#[test]
fn registering_twice_keeps_one_row_and_latest_values_win() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    db::upsert_registration(&conn, &registration("Иванов И.И.", "https://t.me/+one")).unwrap();
    db::upsert_registration(&conn, &registration("Петров П.П.", "https://t.me/+two")).unwrap();

    assert_eq!(db::count_users(&conn).unwrap(), 1);

    let user = db::get_user(&conn, 42).unwrap().expect("row must exist");
    assert_eq!(user.fio.as_deref(), Some("Петров П.П."));
    assert_eq!(user.invite_link, "https://t.me/+two");
}

#[test]
fn stub_upsert_does_not_erase_profile_fields() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    db::upsert_registration(&conn, &registration("Иванов И.И.", "https://t.me/+one")).unwrap();
    // The user runs /start again after registering
    db::upsert_stub(&conn, 42, Some("doc_new"), "https://t.me/+restart").unwrap();

    let user = db::get_user(&conn, 42).unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("doc_new"));
    assert_eq!(user.invite_link, "https://t.me/+restart");
    assert_eq!(user.fio.as_deref(), Some("Иванов И.И."));
    assert!(user.is_complete());
}

#[test]
fn stub_user_is_incomplete() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    db::upsert_stub(&conn, 1, None, "https://t.me/+stub").unwrap();

    let user = db::get_user(&conn, 1).unwrap().unwrap();
    assert!(!user.is_complete());
    assert_eq!(db::count_users(&conn).unwrap(), 1);
    assert_eq!(db::count_complete(&conn).unwrap(), 0);
}

#[test]
fn all_user_ids_are_listed_for_broadcast() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    for id in [5, 3, 8] {
        db::upsert_stub(&conn, id, None, "").unwrap();
    }

    assert_eq!(db::get_all_user_ids(&conn).unwrap(), vec![3, 5, 8]);
    assert_eq!(db::get_all_users(&conn).unwrap().len(), 3);
}

#[test]
fn scheduling_a_check_twice_keeps_a_single_row() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    let first_due = Utc::now() + Duration::days(5);
    let second_due = Utc::now() + Duration::days(10);

    reminders::db::schedule_check(&conn, 42, first_due).unwrap();
    reminders::db::schedule_check(&conn, 42, second_due).unwrap();

    assert_eq!(reminders::db::count_pending(&conn).unwrap(), 1);

    // The replacement moved the deadline: nothing is due before the second
    // date
    let due_soon = reminders::db::due_checks(&conn, first_due + Duration::days(1)).unwrap();
    assert!(due_soon.is_empty());

    let due_later = reminders::db::due_checks(&conn, second_due + Duration::days(1)).unwrap();
    assert_eq!(due_later.len(), 1);
    assert_eq!(due_later[0].telegram_id, 42);
}

#[test]
fn due_scan_only_returns_expired_checks() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    let now = Utc::now();
    reminders::db::schedule_check(&conn, 1, now - Duration::hours(1)).unwrap();
    reminders::db::schedule_check(&conn, 2, now + Duration::days(5)).unwrap();

    let due = reminders::db::due_checks(&conn, now).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].telegram_id, 1);
}

#[test]
fn clearing_a_check_removes_it() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();

    reminders::db::schedule_check(&conn, 1, Utc::now()).unwrap();
    reminders::db::clear_check(&conn, 1).unwrap();

    assert_eq!(reminders::db::count_pending(&conn).unwrap(), 0);
    // Clearing an unknown user is a no-op, not an error
    reminders::db::clear_check(&conn, 999).unwrap();
}
