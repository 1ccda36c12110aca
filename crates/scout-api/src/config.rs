//! Server configuration.

use std::path::PathBuf;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use scout_core::{Error, Result};

/// Configuration for the scout API server.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Enable debug mode.
    ///
    /// When enabled:
    /// - logs are pretty-printed instead of JSON
    /// - the in-memory result store is allowed
    /// - `SCOUT_CALLBACK_BASE_URL` may be omitted (a localhost URL is derived)
    pub debug: bool,

    /// Shared secret: upstream API key, webhook signing secret, and manual
    /// trigger key. The single secret of the whole deployment.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the external task-execution API.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Public base URL this server is reachable at, used to build the
    /// webhook callback URL. Required when `debug` is false.
    #[serde(default)]
    pub callback_base_url: Option<String>,

    /// Optional processor tier override applied to every submission.
    ///
    /// When unset, each task's own processor selector is used.
    #[serde(default)]
    pub processor: Option<String>,

    /// Root directory for the filesystem result store.
    ///
    /// Required when `debug` is false; otherwise the in-memory store is used
    /// with a startup warning.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Optional TOML task registry file. The built-in set is used when unset.
    #[serde(default)]
    pub tasks_path: Option<PathBuf>,

    /// Daily dispatch time (UTC).
    #[serde(default = "default_dispatch_time")]
    pub dispatch_time: NaiveTime,

    /// Fire one dispatch immediately at startup.
    #[serde(default)]
    pub dispatch_on_start: bool,
}

fn default_upstream_url() -> String {
    "https://api.parallel.ai".to_string()
}

fn default_dispatch_time() -> NaiveTime {
    // 06:00 UTC; the components are in range so this cannot fail.
    NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("http_port", &self.http_port)
            .field("debug", &self.debug)
            .field(
                "api_key",
                &if self.api_key.is_empty() {
                    "<unset>"
                } else {
                    "[REDACTED]"
                },
            )
            .field("upstream_url", &self.upstream_url)
            .field("callback_base_url", &self.callback_base_url)
            .field("processor", &self.processor)
            .field("data_dir", &self.data_dir)
            .field("tasks_path", &self.tasks_path)
            .field("dispatch_time", &self.dispatch_time)
            .field("dispatch_on_start", &self.dispatch_on_start)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            debug: false,
            api_key: String::new(),
            upstream_url: default_upstream_url(),
            callback_base_url: None,
            processor: None,
            data_dir: None,
            tasks_path: None,
            dispatch_time: default_dispatch_time(),
            dispatch_on_start: false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Supported env vars:
    /// - `SCOUT_HTTP_PORT`
    /// - `SCOUT_DEBUG`
    /// - `SCOUT_API_KEY`
    /// - `SCOUT_UPSTREAM_URL`
    /// - `SCOUT_CALLBACK_BASE_URL`
    /// - `SCOUT_PROCESSOR`
    /// - `SCOUT_DATA_DIR`
    /// - `SCOUT_TASKS_PATH`
    /// - `SCOUT_DISPATCH_TIME` (UTC `HH:MM`, default `06:00`)
    /// - `SCOUT_DISPATCH_ON_START`
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is present but cannot be
    /// parsed. Missing required values (e.g. the API key) are caught by
    /// [`crate::server::Server`] validation before serving, not here.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = env_u16("SCOUT_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = env_bool("SCOUT_DEBUG")? {
            config.debug = debug;
        }
        if let Some(key) = env_string("SCOUT_API_KEY") {
            config.api_key = key;
        }
        if let Some(url) = env_string("SCOUT_UPSTREAM_URL") {
            config.upstream_url = url;
        }
        if let Some(url) = env_string("SCOUT_CALLBACK_BASE_URL") {
            config.callback_base_url = Some(url);
        }
        if let Some(processor) = env_string("SCOUT_PROCESSOR") {
            config.processor = Some(processor);
        }
        if let Some(dir) = env_string("SCOUT_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = env_string("SCOUT_TASKS_PATH") {
            config.tasks_path = Some(PathBuf::from(path));
        }
        if let Some(time) = env_string("SCOUT_DISPATCH_TIME") {
            config.dispatch_time = parse_dispatch_time("SCOUT_DISPATCH_TIME", &time)?;
        }
        if let Some(on_start) = env_bool("SCOUT_DISPATCH_ON_START")? {
            config.dispatch_on_start = on_start;
        }

        Ok(config)
    }

    /// Returns the full webhook callback URL submitted with every run.
    ///
    /// Falls back to a localhost URL in debug mode when no public base URL
    /// is configured.
    #[must_use]
    pub fn webhook_url(&self) -> String {
        let base = self
            .callback_base_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.http_port));
        format!("{}/webhook", base.trim_end_matches('/'))
    }
}

fn parse_dispatch_time(name: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| {
        Error::config(format!("{name} must be a UTC time in HH:MM form: {e}"))
    })
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::config(format!("{name} must be a u16: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::config(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    parse_bool(name, &v).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_true_values() {
        assert!(parse_bool("TEST", "true").unwrap());
        assert!(parse_bool("TEST", "1").unwrap());
        assert!(parse_bool("TEST", "yes").unwrap());
        assert!(parse_bool("TEST", "TRUE").unwrap());
    }

    #[test]
    fn parse_bool_rejects_invalid_values() {
        assert!(parse_bool("TEST", "maybe").is_err());
        assert!(parse_bool("TEST", "").is_err());
    }

    #[test]
    fn parse_dispatch_time_accepts_hh_mm() {
        let time = parse_dispatch_time("TEST", "06:30").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(6, 30, 0).unwrap());
    }

    #[test]
    fn parse_dispatch_time_rejects_garbage() {
        for value in ["6", "25:00", "noonish", "06:99"] {
            let err = parse_dispatch_time("TEST", value).unwrap_err();
            assert!(matches!(err, Error::Config { .. }), "value {value:?}");
        }
    }

    #[test]
    fn webhook_url_joins_without_double_slash() {
        let config = Config {
            callback_base_url: Some("https://scout.example.com/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.webhook_url(), "https://scout.example.com/webhook");
    }

    #[test]
    fn webhook_url_falls_back_to_localhost() {
        let config = Config {
            http_port: 9999,
            ..Config::default()
        };
        assert_eq!(config.webhook_url(), "http://127.0.0.1:9999/webhook");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = Config {
            api_key: "super-secret".to_string(),
            ..Config::default()
        };
        let output = format!("{config:?}");
        assert!(output.contains("REDACTED"));
        assert!(!output.contains("super-secret"));
    }
}
