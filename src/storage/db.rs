use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Result};

use crate::storage::migrations;

/// Структура, представляющая участника сообщества в базе данных.
#[derive(Debug, Clone)]
pub struct User {
    /// Telegram ID пользователя
    pub telegram_id: i64,
    /// Имя пользователя (username) в Telegram, если доступно
    pub username: Option<String>,
    /// ФИО, заполняется через веб-форму
    pub fio: Option<String>,
    /// Специализация (например, "терапевт", "ординатор")
    pub specialization: Option<String>,
    /// Email, заполняется через веб-форму
    pub email: Option<String>,
    /// Последняя выданная одноразовая ссылка-приглашение
    pub invite_link: String,
    /// Дата регистрации (UTC), обновляется при повторном входе
    pub registered_at: String,
}

impl User {
    /// Профиль считается заполненным, когда есть и ФИО, и специализация.
    /// Это условие управляет веб-формой и напоминаниями.
    pub fn is_complete(&self) -> bool {
        fn filled(value: &Option<String>) -> bool {
            value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
        }

        filled(&self.fio) && filled(&self.specialization)
    }
}

/// Fields written by the registration web form upsert
pub struct Registration<'a> {
    pub telegram_id: i64,
    pub username: Option<&'a str>,
    pub fio: &'a str,
    pub specialization: &'a str,
    pub email: Option<&'a str>,
    pub invite_link: &'a str,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and applies the
/// embedded migrations on the first connection.
pub fn create_pool(database_path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    let mut conn = pool.get()?;
    migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped; handlers keep them
/// in tight scopes and never across awaits.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

const USER_COLUMNS: &str =
    "telegram_id, username, fio, specialization, email, invite_link, registered_at";

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<User> {
    Ok(User {
        telegram_id: row.get(0)?,
        username: row.get(1)?,
        fio: row.get(2)?,
        specialization: row.get(3)?,
        email: row.get(4)?,
        invite_link: row.get(5)?,
        registered_at: row.get(6)?,
    })
}

/// Создаёт или обновляет заглушку пользователя при /start.
///
/// При повторном /start запись не дублируется: обновляются username,
/// последняя ссылка-приглашение и дата регистрации.
pub fn upsert_stub(
    conn: &DbConnection,
    telegram_id: i64,
    username: Option<&str>,
    invite_link: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, username, invite_link)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(telegram_id) DO UPDATE SET
             username = excluded.username,
             invite_link = excluded.invite_link,
             registered_at = CURRENT_TIMESTAMP",
        params![telegram_id, username, invite_link],
    )?;
    Ok(())
}

/// Сохраняет анкету из веб-формы.
///
/// Один атомарный upsert по telegram_id: повторная отправка формы оставляет
/// одну строку, последние значения выигрывают.
pub fn upsert_registration(conn: &DbConnection, reg: &Registration<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, username, fio, specialization, email, invite_link)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(telegram_id) DO UPDATE SET
             username = excluded.username,
             fio = excluded.fio,
             specialization = excluded.specialization,
             email = excluded.email,
             invite_link = excluded.invite_link,
             registered_at = CURRENT_TIMESTAMP",
        params![
            reg.telegram_id,
            reg.username,
            reg.fio,
            reg.specialization,
            reg.email,
            reg.invite_link
        ],
    )?;
    Ok(())
}

/// Получает пользователя по Telegram ID.
pub fn get_user(conn: &DbConnection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?1"),
        params![telegram_id],
        user_from_row,
    )
    .optional()
}

/// Возвращает всех пользователей, отсортированных по Telegram ID.
pub fn get_all_users(conn: &DbConnection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY telegram_id"))?;
    let rows = stmt.query_map([], user_from_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// Возвращает Telegram ID всех известных пользователей (для рассылки).
pub fn get_all_user_ids(conn: &DbConnection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT telegram_id FROM users ORDER BY telegram_id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Общее число пользователей.
pub fn count_users(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

/// Число пользователей с заполненным профилем (ФИО и специализация).
pub fn count_complete(conn: &DbConnection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM users
         WHERE fio IS NOT NULL AND TRIM(fio) != ''
           AND specialization IS NOT NULL AND TRIM(specialization) != ''",
        [],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(fio: Option<&str>, specialization: Option<&str>) -> User {
        User {
            telegram_id: 1,
            username: None,
            fio: fio.map(str::to_string),
            specialization: specialization.map(str::to_string),
            email: None,
            invite_link: String::new(),
            registered_at: String::new(),
        }
    }

    #[test]
    fn completeness_requires_both_fields() {
        assert!(stub(Some("Иванов"), Some("терапевт")).is_complete());
        assert!(!stub(Some("Иванов"), None).is_complete());
        assert!(!stub(None, Some("терапевт")).is_complete());
        assert!(!stub(None, None).is_complete());
    }

    #[test]
    fn blank_strings_do_not_count_as_filled() {
        assert!(!stub(Some("  "), Some("терапевт")).is_complete());
        assert!(!stub(Some("Иванов"), Some("")).is_complete());
    }
}
