//! Queries for the reminder_checks table

use chrono::{DateTime, Utc};
use rusqlite::{params, Result};

use crate::storage::db::DbConnection;

/// Отложенная проверка профиля одного пользователя.
#[derive(Debug, Clone)]
pub struct ReminderCheck {
    pub telegram_id: i64,
    pub due_at: String,
}

/// Планирует проверку профиля.
///
/// PRIMARY KEY по telegram_id + INSERT OR REPLACE: на пользователя всегда
/// не больше одной проверки, повторный /start сдвигает её, а не дублирует.
pub fn schedule_check(conn: &DbConnection, telegram_id: i64, due_at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO reminder_checks (telegram_id, due_at) VALUES (?1, ?2)",
        params![telegram_id, due_at.to_rfc3339()],
    )?;
    Ok(())
}

/// Возвращает проверки, срок которых наступил.
pub fn due_checks(conn: &DbConnection, now: DateTime<Utc>) -> Result<Vec<ReminderCheck>> {
    let mut stmt = conn.prepare(
        "SELECT telegram_id, due_at FROM reminder_checks WHERE due_at <= ?1 ORDER BY due_at",
    )?;
    let rows = stmt.query_map(params![now.to_rfc3339()], |row| {
        Ok(ReminderCheck {
            telegram_id: row.get(0)?,
            due_at: row.get(1)?,
        })
    })?;

    let mut checks = Vec::new();
    for row in rows {
        checks.push(row?);
    }
    Ok(checks)
}

/// Удаляет проверку пользователя (профиль заполнен или пользователь ушёл).
pub fn clear_check(conn: &DbConnection, telegram_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM reminder_checks WHERE telegram_id = ?1",
        params![telegram_id],
    )?;
    Ok(())
}

/// Число ожидающих проверок (для /info).
pub fn count_pending(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM reminder_checks", [], |row| row.get(0))
}
