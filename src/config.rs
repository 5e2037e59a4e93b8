//! Service configuration loaded from environment variables.
//!
//! - `HOST`: bind address (default `127.0.0.1`)
//! - `PORT`: bind port (default `3000`)
//! - `DATABASE_PATH`: SQLite file (default `./data/demo.db`)
//! - `DATA_DIR`: directory holding the fallback plan document (default `./data`)

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: PathBuf::from("./data/demo.db"),
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: "HOST",
                value: self.host.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:3000");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("DATABASE_PATH", "/var/lib/demo/demo.db"),
            ("DATA_DIR", " "),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/demo/demo.db"));
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
