use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const MAX_COMMENT_DEPTH_CEILING: u32 = 256;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Header carrying the caller's user id, set by the upstream identity provider
    pub header: String,
    /// Shard embedded in generated ids
    pub id_shard: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub max_comment_length: usize,
    /// Deepest reply accepted; root comments have depth 0
    pub max_comment_depth: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 20,
            min_connections: 1,
            acquire_timeout_secs: 8,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: "x-echoed-user-id".to_string(),
            id_shard: 0,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            max_comment_length: 10_000,
            max_comment_depth: 128,
        }
    }
}

impl LimitsConfig {
    /// Requested page size, defaulted and clamped to [1, max_page_size]
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults, malformed
    /// values are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Self {
            database: DatabaseConfig {
                url: text(&lookup, "DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
                min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS", defaults.database.min_connections)?,
                acquire_timeout_secs: parsed(
                    &lookup,
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    defaults.database.acquire_timeout_secs,
                )?,
            },
            server: ServerConfig {
                host: text(&lookup, "SERVER_HOST").unwrap_or(defaults.server.host),
                port: parsed(&lookup, "SERVER_PORT", defaults.server.port)?,
            },
            identity: IdentityConfig {
                header: text(&lookup, "IDENTITY_HEADER")
                    .map(|h| h.to_ascii_lowercase())
                    .unwrap_or(defaults.identity.header),
                id_shard: parsed(&lookup, "ID_SHARD", defaults.identity.id_shard)?,
            },
            limits: LimitsConfig {
                default_page_size: parsed(&lookup, "DEFAULT_PAGE_SIZE", defaults.limits.default_page_size)?,
                max_page_size: parsed(&lookup, "MAX_PAGE_SIZE", defaults.limits.max_page_size)?,
                max_comment_length: parsed(
                    &lookup,
                    "MAX_COMMENT_LENGTH",
                    defaults.limits.max_comment_length,
                )?,
                max_comment_depth: parsed(
                    &lookup,
                    "MAX_COMMENT_DEPTH",
                    defaults.limits.max_comment_depth,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.identity.id_shard >= 1024 {
            bail!("ID_SHARD must be less than 1024, got {}", self.identity.id_shard);
        }
        if self.database.min_connections > self.database.max_connections {
            bail!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }
        if self.limits.max_page_size == 0 {
            bail!("MAX_PAGE_SIZE must be positive");
        }
        // Comment trees are serialized recursively
        if self.limits.max_comment_depth > MAX_COMMENT_DEPTH_CEILING {
            bail!(
                "MAX_COMMENT_DEPTH must be at most {}, got {}",
                MAX_COMMENT_DEPTH_CEILING,
                self.limits.max_comment_depth
            );
        }
        axum::http::HeaderName::from_str(&self.identity.header)
            .with_context(|| format!("IDENTITY_HEADER {:?} is not a valid header name", self.identity.header))?;
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn text<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match text(lookup, key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has invalid value {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.identity.header, "x-echoed-user-id");
        assert_eq!(config.limits.default_page_size, 20);
        assert_eq!(config.server_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/echoed"),
            ("SERVER_PORT", "8080"),
            ("IDENTITY_HEADER", "X-User-Id"),
            ("MAX_PAGE_SIZE", "50"),
            ("ID_SHARD", "7"),
        ]))
        .unwrap();
        assert_eq!(config.database.url, "postgresql://localhost/echoed");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.identity.header, "x-user-id");
        assert_eq!(config.limits.max_page_size, 50);
        assert_eq!(config.identity.id_shard, 7);
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = Config::from_lookup(lookup(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }

    #[test]
    fn test_shard_out_of_range() {
        assert!(Config::from_lookup(lookup(&[("ID_SHARD", "2048")])).is_err());
    }

    #[test]
    fn test_comment_depth_limit() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap().limits.max_comment_depth, 128);
        let config = Config::from_lookup(lookup(&[("MAX_COMMENT_DEPTH", "3")])).unwrap();
        assert_eq!(config.limits.max_comment_depth, 3);

        let err = Config::from_lookup(lookup(&[("MAX_COMMENT_DEPTH", "20000")])).unwrap_err();
        assert!(err.to_string().contains("MAX_COMMENT_DEPTH"));
    }

    #[test]
    fn test_page_size_clamping() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.page_size(None), 20);
        assert_eq!(limits.page_size(Some(0)), 1);
        assert_eq!(limits.page_size(Some(5)), 5);
        assert_eq!(limits.page_size(Some(10_000)), 100);
    }
}
