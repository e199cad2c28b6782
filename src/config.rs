/*!
Configuration of the service.

Values come from the defaults below, then an optional `egresso.toml` (or the
file named by `EGRESSO_CONFIG`), then `EGRESSO_*` environment variables, e.g.
`EGRESSO_PORT=8080`.
*/
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Directory with the json seed files, loaded on startup when set.
    pub seed_dir: Option<String>,
    /// Seconds a session stays valid without being used.
    pub session_ttl_secs: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://egresso.db?mode=rwc".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8001,
            seed_dir: None,
            session_ttl_secs: 36000,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("EGRESSO_CONFIG").unwrap_or_else(|_| "egresso".to_string());
        Self::load_from(&file)
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let d = Settings::default();
        Config::builder()
            .set_default("database_url", d.database_url)?
            .set_default("host", d.host)?
            .set_default("port", d.port as i64)?
            .set_default("session_ttl_secs", d.session_ttl_secs)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("EGRESSO"))
            .build()?
            .try_deserialize()
    }

    pub fn addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Error parsing {}:{} as address: {}", &self.host, self.port, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let s = Settings::load_from("does-not-exist/egresso").unwrap();
        assert_eq!(s.session_ttl_secs, 36000);
        assert!(s.seed_dir.is_none());
        assert!(s.addr().is_ok());
    }
}
