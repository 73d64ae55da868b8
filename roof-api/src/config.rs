//! Server configuration.
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults
//! 2. the TOML file passed with `--config`
//! 3. environment: `PORT`, `DATABASE_URL`, `SOLAR_API_KEY`, `LOCAL_SEGMENTATION_URL`
//! 4. command-line flags
//!
//! ```toml
//! [server]
//! port = 3001
//! log_level = "info"
//! log_file = "roof-server.log"
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "roof.db"
//!
//! [providers.solar]
//! api_key = "..."
//!
//! [providers.local_segmentation]
//! base_url = "http://localhost:8000"
//! enabled = true
//!
//! [pricing]
//! coating_slug = "silicona"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use roof_core::db::DbConfig;
use roof_core::estimation::DEFAULT_COATING_SLUG;
use roof_geodata::{LocalSegmentationConfig, SolarInsightsConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATABASE: &str = "roof.db";

#[derive(Parser, Debug, Default)]
#[command(name = "roof-server")]
#[command(version, about = "Roof estimate and pricing API", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database connection string (file path, sqlite: URL or :memory:)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Log filter, e.g. "info" or "roof_api=debug,tower_http=debug"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Append log output to this file as well as stdout
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub database: DbConfig,
    pub providers: ProvidersConfig,
    pub pricing: PricingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            database: DbConfig::sqlite(DEFAULT_DATABASE),
            providers: ProvidersConfig::default(),
            pricing: PricingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub solar: SolarInsightsConfig,
    pub local_segmentation: LocalSegmentationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub coating_slug: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            coating_slug: DEFAULT_COATING_SLUG.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Blank values are ignored.
    pub fn apply_env<F>(
        &mut self,
        lookup: F,
    ) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
        }
        if let Some(url) = var("DATABASE_URL") {
            self.database.connection_string = url;
        }
        if let Some(key) = var("SOLAR_API_KEY") {
            self.providers.solar.api_key = Some(key);
        }
        if let Some(url) = var("LOCAL_SEGMENTATION_URL") {
            self.providers.local_segmentation.base_url = url;
        }
        Ok(())
    }

    pub fn apply_cli(
        &mut self,
        cli: &Cli,
    ) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(database) = &cli.database {
            self.database.connection_string = database.clone();
        }
        if let Some(level) = &cli.log_level {
            self.server.log_level = level.clone();
        }
        if let Some(file) = &cli.log_file {
            self.server.log_file = Some(file.clone());
        }
    }
}

/// Builds the effective configuration from the process environment and `cli`.
pub fn load(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    config.apply_cli(cli);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_serve_sqlite_file_on_3001() {
        let config = ServerConfig::default();

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.database, DbConfig::sqlite("roof.db"));
        assert_eq!(config.pricing.coating_slug, "silicona");
        assert!(config.providers.local_segmentation.enabled);
        assert_eq!(config.providers.solar.api_key, None);
    }

    #[test]
    fn parse_fills_missing_sections_with_defaults() {
        let config = ServerConfig::parse(
            r#"
            [server]
            port = 8080

            [providers.solar]
            api_key = "abc"

            [providers.local_segmentation]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.providers.solar.api_key.as_deref(), Some("abc"));
        assert_eq!(
            config.providers.solar.base_url,
            roof_geodata::DEFAULT_SOLAR_BASE_URL
        );
        assert!(!config.providers.local_segmentation.enabled);
        assert_eq!(config.database.connection_string, "roof.db");
    }

    #[test]
    fn parse_rejects_wrong_types() {
        assert!(ServerConfig::parse("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ServerConfig::default();

        config
            .apply_env(env(&[
                ("PORT", "4000"),
                ("DATABASE_URL", "sqlite:/var/lib/roof/roof.db"),
                ("SOLAR_API_KEY", "secret"),
                ("LOCAL_SEGMENTATION_URL", "http://10.0.0.5:8000"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.connection_string, "sqlite:/var/lib/roof/roof.db");
        assert_eq!(config.providers.solar.api_key.as_deref(), Some("secret"));
        assert_eq!(config.providers.local_segmentation.base_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = ServerConfig::default();

        config.apply_env(env(&[("SOLAR_API_KEY", "  ")])).unwrap();

        assert_eq!(config.providers.solar.api_key, None);
    }

    #[test]
    fn bad_port_in_env_is_an_error() {
        let mut config = ServerConfig::default();

        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();

        assert!(err.to_string().contains("PORT"), "{err}");
    }

    #[test]
    fn cli_flags_win_over_env() {
        let mut config = ServerConfig::default();
        config.apply_env(env(&[("PORT", "4000")])).unwrap();

        config.apply_cli(&Cli {
            port: Some(5000),
            database: Some(":memory:".to_string()),
            log_level: Some("debug".to_string()),
            ..Default::default()
        });

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.server.log_level, "debug");
    }
}
