use std::net::{Ipv4Addr, SocketAddr};

/// The service always listens on this port.
pub const LISTEN_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Default tracing filter; `RUST_LOG` overrides it.
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            name: "todo_api".to_string(),
        }
    }
}

impl Config {
    /// Reads `DATABASE_*` and `LOG_LEVEL` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset and empty values
    /// both fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = DatabaseConfig::default();

        let port = match get("DATABASE_PORT").map(|raw| raw.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!(error = %e, default = defaults.port, "Ignoring invalid DATABASE_PORT");
                defaults.port
            }
            None => defaults.port,
        };

        Self {
            database: DatabaseConfig {
                host: get("DATABASE_HOST").unwrap_or(defaults.host),
                port,
                user: get("DATABASE_USER").unwrap_or(defaults.user),
                password: get("DATABASE_PASSWORD").unwrap_or(defaults.password),
                name: get("DATABASE_NAME").unwrap_or(defaults.name),
            },
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, LISTEN_PORT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.user, "root");
        assert_eq!(config.database.password, "");
        assert_eq!(config.database.name, "todo_api");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            ("DATABASE_HOST", "db.internal"),
            ("DATABASE_PORT", "3307"),
            ("DATABASE_USER", "todo"),
            ("DATABASE_PASSWORD", "secret"),
            ("DATABASE_NAME", "todos"),
            ("LOG_LEVEL", "debug"),
        ]);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.user, "todo");
        assert_eq!(config.database.password, "secret");
        assert_eq!(config.database.name, "todos");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = config_from(&[("DATABASE_HOST", ""), ("DATABASE_USER", "")]);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.user, "root");
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let config = config_from(&[("DATABASE_PORT", "not-a-port")]);
        assert_eq!(config.database.port, 3306);
    }

    #[test]
    fn listen_port_is_fixed() {
        assert_eq!(config_from(&[]).listen_addr().port(), 3000);
    }
}
