use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub ingest: IngestConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ROSTER_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, RosterError> {
        let profile = env_or("ROSTER_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, RosterError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            postgres: PostgresConfig::from_env_profiled(p),
            ingest: IngestConfig::from_env_profiled(p)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!("  postgres:  host={}, db={}", self.postgres.host, self.postgres.database);
        tracing::info!(
            "  ingest:    file={}, delimiter={:?}, batch_size={}",
            self.ingest.csv_file_path.display(),
            self.ingest.delimiter,
            self.ingest.batch_size
        );
    }

    /// Redacted view served by `GET /api/config`. Credentials are never included.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "postgres": {
                "host": self.postgres.host,
                "port": self.postgres.port,
                "database": self.postgres.database,
                "configured": self.postgres.is_configured(),
            },
            "ingest": {
                "csv_file_path": self.ingest.csv_file_path,
                "delimiter": self.ingest.delimiter.to_string(),
                "batch_size": self.ingest.batch_size,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Full connection URL; overrides the individual fields when set.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "DATABASE_URL"),
            host: profiled_env_or(p, "DB_HOST", "localhost"),
            port: profiled_env_u16(p, "DB_PORT", 5432),
            database: profiled_env_or(p, "DB_NAME", "roster"),
            username: profiled_env_opt(p, "DB_USER"),
            password: profiled_env_opt(p, "DB_PASSWORD"),
            max_connections: profiled_env_u32(p, "DB_MAX_CONNECTIONS", 10),
            acquire_timeout_secs: profiled_env_u64(p, "DB_ACQUIRE_TIMEOUT_SECS", 30),
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}",
            user, pass, self.host, self.port, self.database
        )
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.username.is_some()
    }
}

// ── Ingest ────────────────────────────────────────────────────

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub csv_file_path: PathBuf,
    pub delimiter: char,
    pub batch_size: usize,
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Result<Self, RosterError> {
        let raw_delimiter = profiled_env_or(p, "CSV_DELIMITER", ",");
        let delimiter = parse_delimiter(&raw_delimiter)?;
        let batch_size = profiled_env_u32(p, "BATCH_SIZE", DEFAULT_BATCH_SIZE as u32).max(1) as usize;
        Ok(Self {
            csv_file_path: PathBuf::from(profiled_env_or(p, "CSV_FILE_PATH", "data/users.csv")),
            delimiter,
            batch_size,
        })
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            csv_file_path: PathBuf::from("data/users.csv"),
            delimiter: ',',
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A delimiter must be exactly one character. `\t` is accepted as an escape for tab.
fn parse_delimiter(raw: &str) -> Result<char, RosterError> {
    if raw == "\\t" {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(RosterError::Config(format!(
            "CSV_DELIMITER must be a single character, got {:?}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_must_be_single_char() {
        assert_eq!(parse_delimiter(",").unwrap(), ',');
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert!(matches!(parse_delimiter(",,"), Err(RosterError::Config(_))));
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn profiled_keys_take_precedence() {
        env::set_var("CFGTESTA_DB_HOST", "db.internal");
        env::set_var("CFGTESTA_BATCH_SIZE", "250");
        env::set_var("CFGTESTA_CSV_DELIMITER", "|");

        let config = Config::for_profile("cfgtesta").unwrap();
        assert_eq!(config.profile, "CFGTESTA");
        assert_eq!(config.postgres.host, "db.internal");
        assert_eq!(config.ingest.batch_size, 250);
        assert_eq!(config.ingest.delimiter, '|');
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        env::set_var("CFGTESTB_BATCH_SIZE", "0");
        let config = Config::for_profile("cfgtestb").unwrap();
        assert_eq!(config.ingest.batch_size, 1);
    }

    #[test]
    fn invalid_profiled_delimiter_fails() {
        env::set_var("CFGTESTC_CSV_DELIMITER", "ab");
        assert!(Config::for_profile("cfgtestc").is_err());
    }

    #[test]
    fn database_url_prefers_explicit_url() {
        let mut pg = PostgresConfig {
            url: None,
            host: "pg".into(),
            port: 5433,
            database: "people".into(),
            username: Some("app".into()),
            password: Some("secret".into()),
            max_connections: 5,
            acquire_timeout_secs: 30,
        };
        assert_eq!(pg.database_url(), "postgres://app:secret@pg:5433/people");

        pg.url = Some("postgres://other/db".into());
        assert_eq!(pg.database_url(), "postgres://other/db");
    }

    #[test]
    fn redacted_summary_has_no_password() {
        env::set_var("CFGTESTD_DB_PASSWORD", "hunter2");
        let config = Config::for_profile("cfgtestd").unwrap();
        let summary = config.redacted_summary().to_string();
        assert!(!summary.contains("hunter2"));
        assert!(summary.contains("CFGTESTD"));
    }
}
