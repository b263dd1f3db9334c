//! Server configuration from environment variables.
//!
//! | Variable             | Default                              |
//! |----------------------|--------------------------------------|
//! | `HOST`               | `127.0.0.1`                          |
//! | `PORT`               | `3000`                               |
//! | `DEV_MODE`           | `false`                              |
//! | `DATA_DIR`           | `./data` (database at `hifz.db`)     |
//! | `QURAN_DATA_PATH`    | unset: surah table only, no ayah text |
//! | `JWT_SECRET`         | required unless `DEV_MODE`           |
//! | `JWT_TTL_DAYS`       | `30`                                 |
//! | `ADMIN_USERNAMES`    | empty                                |
//! | `LLM_API_KEY`        | unset: AI quizzes disabled           |
//! | `LLM_API_URL`        | OpenRouter chat completions          |
//! | `LLM_MODEL`          | `google/gemini-2.0-flash-001`        |
//! | `QUIZ_MAX_QUESTIONS` | `20`                                 |

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::llm::OPENROUTER_API_URL;

pub const DEFAULT_LLM_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DATABASE_FILE: &str = "hifz.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when DEV_MODE is off")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub jwt_ttl_days: i64,
    /// Usernames (lowercased) that register as admins
    pub admin_usernames: Vec<String>,
}

impl AuthConfig {
    pub fn is_admin_username(&self, username: &str) -> bool {
        let username = username.to_lowercase();
        self.admin_usernames.iter().any(|u| *u == username)
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Skip authentication and act as a local `dev` user
    pub dev_mode: bool,
    pub data_dir: PathBuf,
    pub quran_data_path: Option<PathBuf>,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub quiz_max_questions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let dev_mode = match get("DEV_MODE") {
            Some(v) => parse_bool("DEV_MODE", &v)?,
            None => false,
        };

        let jwt_secret = get("JWT_SECRET");
        if jwt_secret.is_none() && !dev_mode {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let jwt_ttl_days: i64 = parse_or("JWT_TTL_DAYS", get("JWT_TTL_DAYS"), 30)?;
        if jwt_ttl_days < 1 {
            return Err(invalid("JWT_TTL_DAYS", jwt_ttl_days, "must be at least 1"));
        }
        let quiz_max_questions: usize =
            parse_or("QUIZ_MAX_QUESTIONS", get("QUIZ_MAX_QUESTIONS"), 20)?;
        if quiz_max_questions == 0 {
            return Err(invalid("QUIZ_MAX_QUESTIONS", 0, "must be at least 1"));
        }

        let admin_usernames = get("ADMIN_USERNAMES")
            .map(|v| {
                v.split(',')
                    .map(|u| u.trim().to_lowercase())
                    .filter(|u| !u.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", get("PORT"), 3000)?,
            dev_mode,
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            quran_data_path: get("QURAN_DATA_PATH").map(PathBuf::from),
            auth: AuthConfig {
                jwt_secret,
                jwt_ttl_days,
                admin_usernames,
            },
            llm: LlmConfig {
                api_key: get("LLM_API_KEY"),
                api_url: get("LLM_API_URL").unwrap_or_else(|| OPENROUTER_API_URL.to_string()),
                model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            },
            quiz_max_questions,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e: T::Err| invalid(name, &v, &e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert!(!cfg.dev_mode);
        assert_eq!(cfg.database_path(), PathBuf::from("./data").join("hifz.db"));
        assert_eq!(cfg.auth.jwt_ttl_days, 30);
        assert!(cfg.llm.api_key.is_none());
        assert_eq!(cfg.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(cfg.quiz_max_questions, 20);
    }

    #[test]
    fn test_secret_required_outside_dev_mode() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        assert!(matches!(
            config(&[("JWT_SECRET", "   ")]),
            Err(ConfigError::Missing(_))
        ));
        let cfg = config(&[("DEV_MODE", "true")]).unwrap();
        assert!(cfg.dev_mode);
        assert!(cfg.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("JWT_SECRET", "s"), ("PORT", "http")]),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("DEV_MODE", "maybe")]),
            Err(ConfigError::InvalidValue { name: "DEV_MODE", .. })
        ));
        assert!(matches!(
            config(&[("JWT_SECRET", "s"), ("QUIZ_MAX_QUESTIONS", "0")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_admin_usernames() {
        let cfg = config(&[("JWT_SECRET", "s"), ("ADMIN_USERNAMES", " Omar, ,fatima ")]).unwrap();
        assert_eq!(cfg.auth.admin_usernames, vec!["omar", "fatima"]);
        assert!(cfg.auth.is_admin_username("OMAR"));
        assert!(!cfg.auth.is_admin_username("ali"));
    }
}
