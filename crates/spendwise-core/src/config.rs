use std::{collections::HashMap, env, fs, path::Path, time::Duration};

use chrono::FixedOffset;
use serde::Deserialize;

use crate::{errors::Error, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Typed configuration for the bridge.
///
/// Passed around as `Arc<Config>`; nothing reads the environment after `load()`.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_url: String,
    pub allowed_chat_ids: Vec<i64>,
    pub user_names: HashMap<i64, String>,

    // Backend
    pub api_url: String,
    pub api_secret: String,
    pub api_timeout: Duration,

    // Internal HTTP server
    pub port: u16,

    /// Offset used to decide which calendar day "today" is.
    pub reference_offset: FixedOffset,
}

/// JSON shape accepted in `CONFIG_JSON` (a secret-manager blob).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SecretConfig {
    bot_token: String,
    allowed_ids: Vec<String>,
    api_url: String,
    bot_url: String,
    api_secret: String,
    port: String,
    user_names: HashMap<String, String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        if let Some(raw) = env_str("CONFIG_JSON").and_then(non_empty) {
            match Self::from_json(&raw) {
                Ok(cfg) => {
                    tracing::info!("configuration loaded from CONFIG_JSON");
                    return Ok(cfg);
                }
                Err(e @ Error::Json(_)) => {
                    tracing::warn!("failed to parse CONFIG_JSON ({e}); falling back to env vars");
                }
                Err(e) => return Err(e),
            }
        }

        Self::from_env()
    }

    /// Build from a `CONFIG_JSON` document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let secret: SecretConfig = serde_json::from_str(raw)?;

        let allowed_chat_ids = secret
            .allowed_ids
            .iter()
            .filter_map(|id| id.trim().parse::<i64>().ok())
            .collect();
        let user_names = secret
            .user_names
            .into_iter()
            .filter_map(|(k, v)| {
                let id = k.trim().parse::<i64>().ok()?;
                non_empty(v.trim().to_string()).map(|v| (id, v))
            })
            .collect();

        Ok(Self {
            bot_token: required("botToken", non_empty(secret.bot_token))?,
            bot_url: required("botUrl", non_empty(secret.bot_url))?,
            allowed_chat_ids,
            user_names,
            api_url: non_empty(secret.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_secret: required("apiSecret", non_empty(secret.api_secret))?,
            api_timeout: Duration::from_millis(env_u64("API_TIMEOUT_MS").unwrap_or(30_000)),
            port: parse_port(non_empty(secret.port))?,
            reference_offset: reference_offset()?,
        })
    }

    /// Build from individual environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bot_token: required("BOT_TOKEN", env_str("BOT_TOKEN").and_then(non_empty))?,
            bot_url: required("BOT_URL", env_str("BOT_URL").and_then(non_empty))?,
            allowed_chat_ids: parse_csv_i64(env_str("ALLOWED_IDS")),
            user_names: parse_user_names(env_str("USER_NAMES")),
            api_url: env_str("API_URL")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_secret: required("API_SECRET", env_str("API_SECRET").and_then(non_empty))?,
            api_timeout: Duration::from_millis(env_u64("API_TIMEOUT_MS").unwrap_or(30_000)),
            port: parse_port(env_str("PORT").and_then(non_empty))?,
            reference_offset: reference_offset()?,
        })
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.bot_url.trim_end_matches('/'))
    }
}

fn required(key: &str, v: Option<String>) -> Result<String> {
    v.ok_or_else(|| Error::Config(format!("{key} is required in configuration")))
}

fn parse_port(v: Option<String>) -> Result<u16> {
    match v {
        None => Ok(DEFAULT_PORT),
        Some(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("invalid port: {s}"))),
    }
}

fn reference_offset() -> Result<FixedOffset> {
    parse_reference_offset(env_str("REFERENCE_UTC_OFFSET_MINUTES"))
}

fn parse_reference_offset(v: Option<String>) -> Result<FixedOffset> {
    let minutes = match v.and_then(non_empty) {
        None => 0,
        Some(s) => s.trim().parse::<i32>().map_err(|_| {
            Error::Config(format!("invalid REFERENCE_UTC_OFFSET_MINUTES: {s}"))
        })?,
    };
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            Error::Config(format!(
                "REFERENCE_UTC_OFFSET_MINUTES out of range: {minutes}"
            ))
        })
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

/// `chatId:name,chatId:name`. Malformed pairs are skipped.
fn parse_user_names(v: Option<String>) -> HashMap<i64, String> {
    v.unwrap_or_default()
        .split(',')
        .filter_map(|pair| {
            let (id, name) = pair.split_once(':')?;
            let id = id.trim().parse::<i64>().ok()?;
            let name = name.trim();
            if name.is_empty() || name.contains(':') {
                return None;
            }
            Some((id, name.to_string()))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_name_pairs() {
        let m = parse_user_names(Some("1:alice, 2 : bob ,bad,3:,x:y,4:a:b".to_string()));
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&1).map(String::as_str), Some("alice"));
        assert_eq!(m.get(&2).map(String::as_str), Some("bob"));
    }

    #[test]
    fn parses_allowed_ids_csv() {
        assert_eq!(
            parse_csv_i64(Some(" 10, -20,,abc,30 ".to_string())),
            vec![10, -20, 30]
        );
        assert!(parse_csv_i64(None).is_empty());
    }

    #[test]
    fn json_config_applies_defaults() {
        let cfg = Config::from_json(
            r#"{
                "botToken": "t",
                "botUrl": "https://bot.example/",
                "apiSecret": "s",
                "allowedIds": ["42", " 7 ", "nope"],
                "userNames": {"42": "Alice", "7": "  "}
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.allowed_chat_ids, vec![42, 7]);
        assert_eq!(cfg.user_names.len(), 1);
        assert_eq!(cfg.webhook_url(), "https://bot.example/webhook");
    }

    #[test]
    fn json_config_requires_secret() {
        let err = Config::from_json(r#"{"botToken": "t", "botUrl": "u"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("apiSecret")));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(Config::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn rejects_bad_port() {
        assert!(parse_port(Some("http".to_string())).is_err());
        assert_eq!(parse_port(Some(" 9000 ".to_string())).unwrap(), 9000);
    }

    #[test]
    fn reference_offset_bounds() {
        assert_eq!(
            parse_reference_offset(None).unwrap(),
            FixedOffset::east_opt(0).unwrap()
        );
        assert_eq!(
            parse_reference_offset(Some("330".to_string())).unwrap(),
            FixedOffset::east_opt(330 * 60).unwrap()
        );
        assert_eq!(
            parse_reference_offset(Some("-300".to_string())).unwrap(),
            FixedOffset::west_opt(300 * 60).unwrap()
        );
        for bad in ["1440", "99999999", "-2147483648", "half"] {
            assert!(
                matches!(
                    parse_reference_offset(Some(bad.to_string())),
                    Err(Error::Config(_))
                ),
                "{bad}"
            );
        }
    }
}
