//! Monitor configuration.
//!
//! Loaded from a TOML file or from environment variables:
//!
//! - `PERMIT_ALERTS_REFRESH_SECS`: refresh interval (default 3600)
//! - `PERMIT_ALERTS_PAGE_LIMIT`: projects fetched per refresh (default 1000)
//! - `PERMIT_ALERTS_TIMEOUT_SECS`: HTTP request timeout (default 30)
//! - `PERMIT_ALERTS_UTC_OFFSET`: evaluation offset such as `+09:00`
//!   (default: the machine's local zone)
//! - `PERMIT_ALERTS_PROJECTS_FILE`: read projects from a JSON file
//! - `SUPABASE_URL` / `SUPABASE_ANON_KEY`: read projects from Supabase
//! - `PERMIT_ALERTS_API_URL`: read projects from the REST API
//!
//! Source precedence is file, then Supabase, then the REST API.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::SystemClock;
use crate::error::ConfigError;
use crate::realtime::ReconnectPolicy;
use crate::rules::RuleThresholds;
use crate::source::{
    FileProjectSource, ProjectSource, RestProjectSource, SupabaseProjectSource,
};

pub const ENV_REFRESH_SECS: &str = "PERMIT_ALERTS_REFRESH_SECS";
pub const ENV_PAGE_LIMIT: &str = "PERMIT_ALERTS_PAGE_LIMIT";
pub const ENV_TIMEOUT_SECS: &str = "PERMIT_ALERTS_TIMEOUT_SECS";
pub const ENV_UTC_OFFSET: &str = "PERMIT_ALERTS_UTC_OFFSET";
pub const ENV_PROJECTS_FILE: &str = "PERMIT_ALERTS_PROJECTS_FILE";
pub const ENV_API_URL: &str = "PERMIT_ALERTS_API_URL";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

/// Default REST API address (local development server).
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Where the project list is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Rest { base_url: String },
    Supabase { url: String, anon_key: String },
    File { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Rest {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Configuration for the alert board and its refresh monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between scheduled refreshes
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Maximum projects fetched per refresh
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Offset day counts are computed in, e.g. "+09:00"
    #[serde(default)]
    pub utc_offset: Option<String>,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub thresholds: RuleThresholds,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

fn default_refresh_interval_secs() -> u64 {
    3600
}
fn default_page_limit() -> u32 {
    1000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            utc_offset: None,
            source: SourceConfig::default(),
            thresholds: RuleThresholds::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl MonitorConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(value) = get(ENV_REFRESH_SECS) {
            config.refresh_interval_secs = parse_number(ENV_REFRESH_SECS, &value)?;
        }
        if let Some(value) = get(ENV_PAGE_LIMIT) {
            config.page_limit = parse_number(ENV_PAGE_LIMIT, &value)?;
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_number(ENV_TIMEOUT_SECS, &value)?;
        }
        config.utc_offset = get(ENV_UTC_OFFSET);

        config.source = if let Some(path) = get(ENV_PROJECTS_FILE) {
            SourceConfig::File { path: path.into() }
        } else if let (Some(url), Some(anon_key)) =
            (get(ENV_SUPABASE_URL), get(ENV_SUPABASE_ANON_KEY))
        {
            SourceConfig::Supabase { url, anon_key }
        } else {
            SourceConfig::Rest {
                base_url: get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(invalid("refresh_interval_secs", "must be greater than zero"));
        }
        if self.page_limit == 0 {
            return Err(invalid("page_limit", "must be greater than zero"));
        }
        if self.reconnect.max_delay_ms < self.reconnect.base_delay_ms {
            return Err(invalid(
                "reconnect.max_delay_ms",
                "must not be smaller than base_delay_ms",
            ));
        }
        self.offset()?;
        self.thresholds.validate()
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured evaluation offset, if any.
    pub fn offset(&self) -> Result<Option<FixedOffset>, ConfigError> {
        self.utc_offset.as_deref().map(parse_offset).transpose()
    }

    /// Clock in the configured offset, or the local zone.
    pub fn clock(&self) -> Result<SystemClock, ConfigError> {
        Ok(self
            .offset()?
            .map_or_else(SystemClock::local, SystemClock::with_offset))
    }

    /// Instantiate the configured project source.
    #[must_use]
    pub fn build_source(&self) -> Arc<dyn ProjectSource> {
        match &self.source {
            SourceConfig::Rest { base_url } => Arc::new(RestProjectSource::new(
                base_url,
                self.page_limit,
                self.request_timeout(),
            )),
            SourceConfig::Supabase { url, anon_key } => Arc::new(SupabaseProjectSource::new(
                url,
                anon_key,
                self.page_limit,
                self.request_timeout(),
            )),
            SourceConfig::File { path } => Arc::new(FileProjectSource::new(path.clone())),
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| invalid(field, &format!("expected a number, got {value:?}")))
}

/// Parse `Z`, `UTC`, `+09:00`, `+0900` or `-05`.
pub fn parse_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let value = raw.trim();
    let err = || invalid("utc_offset", &format!("expected an offset like +09:00, got {value:?}"));

    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(err);
    }

    let (sign, rest) = if let Some(rest) = value.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(err());
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().map_err(|_| err())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| err())?,
            digits[2..].parse::<i32>().map_err(|_| err())?,
        ),
        _ => return Err(err()),
    };
    if hours > 23 || minutes > 59 {
        return Err(err());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
}
