//! Server configuration.
//!
//! Configuration is stored as TOML at `$SEANCE_CONFIG`, or `./seance.toml`
//! when that is unset. `PORT` overrides the configured port.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use seance_auth::BuilderAuthConfig;
use serde::{Deserialize, Serialize};

const CONFIG_ENV: &str = "SEANCE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "seance.toml";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    /// HTTP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root of the local store; `releases/` and `web/` live beneath it.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Origin clients use to reach this server.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Product name used in installer file names.
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Who may deploy.
    pub builder_auth: BuilderAuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Where deployed artifacts are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Files under `data_root`.
    #[default]
    Local,
    /// A DigitalOcean Spaces bucket configured through `SPACES_*` variables.
    Spaces,
}

fn default_bind() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_data_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_public_base_url() -> String {
    "https://backend.seance.dev".into()
}

fn default_product_name() -> String {
    "Seance".into()
}

impl Config {
    /// Loads the config file named by the environment and applies overrides.
    ///
    /// A missing file is an error: without it there are no builder
    /// credentials.
    pub fn load() -> anyhow::Result<Self> {
        let lookup = |name: &str| std::env::var(name).ok();
        let path = config_path(lookup);

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.apply_env(lookup)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies environment overrides.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT {port:?}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            bail!(
                "public_base_url must be an http(s) URL, got {:?}",
                self.public_base_url
            );
        }
        if self.product_name.trim().is_empty() {
            bail!("product_name must not be empty");
        }
        Ok(())
    }
}

/// Path of the config file: `$SEANCE_CONFIG` or `./seance.toml`.
fn config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(CONFIG_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
