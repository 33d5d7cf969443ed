//! Connection configuration.
//!
//! Loaded from TOML, either at the top level or under a `[database]` table:
//!
//! ```toml
//! [database]
//! host = "db.internal"
//! database = "calendar"
//! user = "app"
//! password = "${DB_PASSWORD}"
//! type_mode = "strict"
//! ```
//!
//! `${VAR}` references in string values are expanded from the environment.

use crate::error::{StmtError, StmtResult};
use crate::types::TypeMode;
use serde::Deserialize;
use std::path::Path;

/// Where and how to connect.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub charset: String,
    pub max_connections: u32,
    pub type_mode: TypeMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            database: String::new(),
            user: "root".to_string(),
            password: String::new(),
            charset: "utf8mb4".to_string(),
            max_connections: 10,
            type_mode: TypeMode::Lenient,
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("charset", &self.charset)
            .field("max_connections", &self.max_connections)
            .field("type_mode", &self.type_mode)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Nested { database: ConnectionConfig },
    Flat(ConnectionConfig),
}

impl ConnectionConfig {
    /// Parse TOML text.
    pub fn from_toml_str(raw: &str) -> StmtResult<Self> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| StmtError::Config(format!("failed to parse config: {e}")))?;
        let mut config = match file {
            ConfigFile::Nested { database } => database,
            ConfigFile::Flat(config) => config,
        };
        config.expand_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> StmtResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StmtError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loading connection config");
        Self::from_toml_str(&raw)
    }

    /// Build from `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`,
    /// `DB_CHARSET`, `DB_MAX_CONNECTIONS` and `DB_TYPE_MODE`.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> StmtResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StmtResult<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup("DB_HOST") {
            config.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            config.port = parse_var("DB_PORT", &v)?;
        }
        if let Some(v) = lookup("DB_NAME") {
            config.database = v;
        }
        if let Some(v) = lookup("DB_USER") {
            config.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            config.password = v;
        }
        if let Some(v) = lookup("DB_CHARSET") {
            config.charset = v;
        }
        if let Some(v) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = parse_var("DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DB_TYPE_MODE") {
            config.type_mode = match v.trim().to_ascii_lowercase().as_str() {
                "strict" => TypeMode::Strict,
                "lenient" => TypeMode::Lenient,
                other => {
                    return Err(StmtError::Config(format!("invalid DB_TYPE_MODE: {other}")));
                }
            };
        }
        config.validate()?;
        Ok(config)
    }

    fn expand_env(&mut self) -> StmtResult<()> {
        for field in [
            &mut self.host,
            &mut self.database,
            &mut self.user,
            &mut self.password,
            &mut self.charset,
        ] {
            *field = expand_env_vars(field, |key| std::env::var(key).ok())?;
        }
        Ok(())
    }

    fn validate(&self) -> StmtResult<()> {
        if self.host.trim().is_empty() {
            return Err(StmtError::Config("host must not be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(StmtError::Config("database must not be empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(StmtError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> StmtResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StmtError::Config(format!("invalid {key}: {value}")))
}

/// Expand `${VAR}` references.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> StmtResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(StmtError::Config(format!(
                    "unterminated env var reference: ${{{key}"
                )));
            }
            if key.is_empty() {
                return Err(StmtError::Config("invalid env var reference: ${}".to_string()));
            }
            let value = lookup(&key)
                .ok_or_else(|| StmtError::Config(format!("missing env var: {key}")))?;
            out.push_str(&value);
            continue;
        }
        out.push(c);
    }

    Ok(out)
}
