//! Registration web app
//!
//! Serves the profile form as a Telegram Web App and the JSON endpoint the
//! form posts to. Completeness of the user's row decides between the form
//! and the success page with the invite link.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::core::{config, metrics};
use crate::reminders;
use crate::storage::db::{self, DbPool, Registration};
use crate::storage::get_connection;
use crate::telegram::invite::create_one_time_invite;
use crate::telegram::notifications::notify_admin_registration;
use crate::telegram::webapp_auth;

/// Shared state for the web app
#[derive(Clone)]
struct WebAppState {
    db_pool: Arc<DbPool>,
    bot: Bot,
    bot_token: String,
}

/// GET / query parameters
#[derive(Debug, Deserialize)]
struct IndexParams {
    uid: Option<i64>,
}

/// POST /register body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub fio: String,
    pub specialization: String,
    pub email: Option<String>,
    /// Telegram Web App initData, checked when validation is enabled
    pub init_data: Option<String>,
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Creates the web app router
pub fn create_webapp_router(db_pool: Arc<DbPool>, bot: Bot, bot_token: String) -> Router {
    let state = WebAppState {
        db_pool,
        bot,
        bot_token,
    };

    // CORS so the form also works opened in a plain browser
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/register", post(handle_register))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Runs the registration web server
pub async fn run_webapp_server(port: u16, db_pool: Arc<DbPool>, bot: Bot) -> anyhow::Result<()> {
    let app = create_webapp_router(db_pool, bot, config::BOT_TOKEN.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("Starting registration web server on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "reclin-webapp"
    }))
}

/// GET / — the form for incomplete profiles, the success page for complete
/// ones
async fn handle_index(
    State(state): State<Arc<WebAppState>>,
    Query(params): Query<IndexParams>,
) -> Result<Html<String>, AppError> {
    let uid = params
        .uid
        .ok_or_else(|| AppError::BadRequest("no uid".to_string()))?;

    let user = {
        let conn = get_connection(&state.db_pool)
            .map_err(|e| AppError::Internal(format!("DB connection error: {}", e)))?;
        db::get_user(&conn, uid).map_err(|e| AppError::Internal(format!("DB error: {}", e)))?
    };

    match user {
        Some(user) if user.is_complete() => Ok(Html(render_success_page(&user.invite_link))),
        _ => Ok(Html(render_form_page(uid))),
    }
}

/// POST /register — upsert the profile, mint a fresh invite, return it
async fn handle_register(
    State(state): State<Arc<WebAppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if *config::webapp::VALIDATE_INIT_DATA {
        let init_data = req
            .init_data
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("init_data is required".to_string()))?;
        let authenticated_id = webapp_auth::validate_telegram_webapp_data(init_data, &state.bot_token)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;
        if authenticated_id != req.telegram_id {
            return Err(AppError::Unauthorized(
                "init_data user does not match telegram_id".to_string(),
            ));
        }
    }

    let fio = req.fio.trim();
    let specialization = req.specialization.trim();
    if fio.is_empty() {
        return Err(AppError::BadRequest("fio is required".to_string()));
    }
    if specialization.is_empty() {
        return Err(AppError::BadRequest("specialization is required".to_string()));
    }

    log::info!("Registration request from user {}", req.telegram_id);

    // A fresh single-use link every time, even for repeated submissions
    let invite_link = create_one_time_invite(&state.bot, ChatId(*config::COMMUNITY_CHAT_ID))
        .await
        .map_err(|e| {
            log::error!("Failed to create invite link for {}: {}", req.telegram_id, e);
            AppError::Internal("Failed to create invite link".to_string())
        })?;

    {
        let conn = get_connection(&state.db_pool)
            .map_err(|e| AppError::Internal(format!("DB connection error: {}", e)))?;

        db::upsert_registration(
            &conn,
            &Registration {
                telegram_id: req.telegram_id,
                username: req.username.as_deref(),
                fio,
                specialization,
                email: req.email.as_deref(),
                invite_link: &invite_link,
            },
        )
        .map_err(|e| AppError::Internal(format!("DB error: {}", e)))?;

        // Complete profile is a terminal state, no more checks for this user
        if let Err(e) = reminders::db::clear_check(&conn, req.telegram_id) {
            log::warn!("Failed to clear reminder check for {}: {}", req.telegram_id, e);
        }
    }

    metrics::REGISTRATIONS_TOTAL.inc();

    let bot = state.bot.clone();
    let telegram_id = req.telegram_id;
    let fio_notify = fio.to_string();
    tokio::spawn(async move {
        notify_admin_registration(&bot, telegram_id, &fio_notify).await;
    });

    Ok(Json(json!({ "link": invite_link })))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The registration form page
fn render_form_page(uid: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Терапия|Reclin — регистрация</title>
<script src="https://telegram.org/js/telegram-web-app.js"></script>
<style>
  body {{ font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 24px;
         background: var(--tg-theme-bg-color, #f5f6f8); color: var(--tg-theme-text-color, #1d222a); }}
  .card {{ max-width: 420px; margin: 0 auto; background: var(--tg-theme-secondary-bg-color, #fff);
           border-radius: 12px; padding: 24px; box-shadow: 0 2px 12px rgba(0,0,0,.07); }}
  h1 {{ font-size: 20px; margin: 0 0 16px; }}
  label {{ display: block; font-size: 14px; margin: 12px 0 4px; }}
  input {{ width: 100%; box-sizing: border-box; padding: 10px; font-size: 15px;
           border: 1px solid #cfd4dc; border-radius: 8px; }}
  button {{ width: 100%; margin-top: 20px; padding: 12px; font-size: 16px; border: 0;
            border-radius: 8px; background: var(--tg-theme-button-color, #2ea6ff);
            color: var(--tg-theme-button-text-color, #fff); }}
  .error {{ color: #c0392b; font-size: 14px; margin-top: 12px; display: none; }}
</style>
</head>
<body>
<div class="card">
  <h1>🩺 Подключение к сообществу</h1>
  <form id="reg-form">
    <label for="fio">ФИО *</label>
    <input id="fio" name="fio" required>
    <label for="specialization">Специализация *</label>
    <input id="specialization" name="specialization" required>
    <label for="email">Email</label>
    <input id="email" name="email" type="email">
    <button type="submit">Отправить</button>
    <div class="error" id="error"></div>
  </form>
</div>
<script>
  const tg = window.Telegram ? window.Telegram.WebApp : null;
  if (tg) tg.ready();

  document.getElementById('reg-form').addEventListener('submit', async (e) => {{
    e.preventDefault();
    const errorBox = document.getElementById('error');
    errorBox.style.display = 'none';

    const tgUser = tg && tg.initDataUnsafe ? tg.initDataUnsafe.user : null;
    const body = {{
      telegram_id: {uid},
      username: tgUser ? tgUser.username : null,
      fio: document.getElementById('fio').value,
      specialization: document.getElementById('specialization').value,
      email: document.getElementById('email').value || null,
      init_data: tg ? tg.initData : null
    }};

    try {{
      const resp = await fetch('/register', {{
        method: 'POST',
        headers: {{ 'Content-Type': 'application/json' }},
        body: JSON.stringify(body)
      }});
      const data = await resp.json();
      if (!resp.ok) throw new Error(data.error || 'Ошибка регистрации');
      window.location = '/?uid={uid}';
    }} catch (err) {{
      errorBox.textContent = err.message;
      errorBox.style.display = 'block';
    }}
  }});
</script>
</body>
</html>"#
    )
}

/// The success page with the personal invite link
fn render_success_page(invite_link: &str) -> String {
    let link = html_escape(invite_link);
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Терапия|Reclin — готово</title>
<script src="https://telegram.org/js/telegram-web-app.js"></script>
<style>
  body {{ font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 24px;
         background: var(--tg-theme-bg-color, #f5f6f8); color: var(--tg-theme-text-color, #1d222a);
         text-align: center; }}
  .card {{ max-width: 420px; margin: 0 auto; background: var(--tg-theme-secondary-bg-color, #fff);
           border-radius: 12px; padding: 32px 24px; box-shadow: 0 2px 12px rgba(0,0,0,.07); }}
  a.button {{ display: block; margin-top: 24px; padding: 12px; font-size: 16px; border-radius: 8px;
              background: var(--tg-theme-button-color, #2ea6ff); text-decoration: none;
              color: var(--tg-theme-button-text-color, #fff); }}
</style>
</head>
<body>
<div class="card">
  <h1>✅ Анкета заполнена</h1>
  <p>Ваша персональная ссылка для входа в сообщество:</p>
  <a class="button" href="{link}">Войти в чат</a>
</div>
</body>
</html>"#
    )
}
