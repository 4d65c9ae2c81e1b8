//! Telegram Web App initData validation
//!
//! Telegram signs the data it passes to a Web App with
//! HMAC-SHA256(data_check_string, HMAC-SHA256("WebAppData", bot_token)).
//! The form backend verifies that signature before trusting the user id in
//! the payload.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

/// initData must not be older than this (seconds)
const MAX_INIT_DATA_AGE_SECS: i64 = 86_400;

/// Parses the query-string shaped initData into key/value pairs.
fn parse_init_data(init_data: &str) -> HashMap<String, String> {
    init_data
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let value = urlencoding::decode(value).ok()?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// The string Telegram actually signed: every pair except `hash`, sorted by
/// key, joined with newlines.
fn data_check_string(params: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = params
        .iter()
        .filter(|(key, _)| key.as_str() != "hash")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    pairs.sort();
    pairs.join("\n")
}

fn compute_hash(data_check_string: &str, bot_token: &str) -> String {
    let mut secret_key_mac =
        HmacSha256::new_from_slice(b"WebAppData").expect("HMAC accepts any key size");
    secret_key_mac.update(bot_token.as_bytes());
    let secret_key = secret_key_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts any key size");
    mac.update(data_check_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Validates initData and returns the authenticated Telegram user id.
///
/// Fails on a missing or wrong `hash`, on stale `auth_date`, and on a payload
/// without a user id.
pub fn validate_telegram_webapp_data(init_data: &str, bot_token: &str) -> Result<i64> {
    let params = parse_init_data(init_data);

    let received_hash = params
        .get("hash")
        .ok_or_else(|| anyhow!("Missing hash parameter"))?;

    let calculated_hash = compute_hash(&data_check_string(&params), bot_token);
    if calculated_hash != *received_hash {
        return Err(anyhow!("Invalid hash - data may be tampered"));
    }

    if let Some(auth_date) = params.get("auth_date").and_then(|s| s.parse::<i64>().ok()) {
        let now = chrono::Utc::now().timestamp();
        let age = now - auth_date;
        if age > MAX_INIT_DATA_AGE_SECS {
            return Err(anyhow!("Init data is too old ({} seconds)", age));
        }
    }

    let user_json = params
        .get("user")
        .ok_or_else(|| anyhow!("Missing user parameter"))?;
    let user: serde_json::Value =
        serde_json::from_str(user_json).map_err(|e| anyhow!("Failed to parse user JSON: {}", e))?;

    user.get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| anyhow!("Missing user id in user JSON"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "12345:TEST_TOKEN";

    /// Builds initData signed the way Telegram signs it.
    fn signed_init_data(user_id: i64, auth_date: i64) -> String {
        let user = format!(r#"{{"id":{},"first_name":"Test"}}"#, user_id);
        let params = vec![
            ("auth_date".to_string(), auth_date.to_string()),
            ("query_id".to_string(), "AAE".to_string()),
            ("user".to_string(), user.clone()),
        ];

        let mut pairs: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        pairs.sort();
        let hash = compute_hash(&pairs.join("\n"), TOKEN);

        format!(
            "auth_date={}&query_id=AAE&user={}&hash={}",
            auth_date,
            urlencoding::encode(&user),
            hash
        )
    }

    #[test]
    fn accepts_correctly_signed_data() {
        let init_data = signed_init_data(42, chrono::Utc::now().timestamp());
        assert_eq!(
            validate_telegram_webapp_data(&init_data, TOKEN).unwrap(),
            42
        );
    }

    #[test]
    fn rejects_tampered_hash() {
        let mut init_data = signed_init_data(42, chrono::Utc::now().timestamp());
        init_data.truncate(init_data.len() - 2);
        init_data.push_str("ff");
        assert!(validate_telegram_webapp_data(&init_data, TOKEN).is_err());
    }

    #[test]
    fn rejects_missing_hash() {
        assert!(validate_telegram_webapp_data("auth_date=1&user=%7B%7D", TOKEN).is_err());
    }

    #[test]
    fn rejects_stale_auth_date() {
        let init_data = signed_init_data(42, chrono::Utc::now().timestamp() - 200_000);
        assert!(validate_telegram_webapp_data(&init_data, TOKEN).is_err());
    }

    #[test]
    fn rejects_signature_from_another_token() {
        let init_data = signed_init_data(42, chrono::Utc::now().timestamp());
        assert!(validate_telegram_webapp_data(&init_data, "999:OTHER").is_err());
    }
}
