//! Layered configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. Global file `~/.config/tierlist/tierlist.{toml,yaml,yml,json}`
//! 3. Project file `./.tierlist/tierlist.{toml,yaml,yml,json}`
//! 4. `TIERLIST_` environment variables, nested with `__`
//!    (`TIERLIST_SEARCH__DEBOUNCE_MS=150`)

use crate::catalog::RetryPolicy;
use crate::error::Result;
use crate::palette::{Palette, DEFAULT_PALETTE};
use crate::search::SearchOptions;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace};

const CONFIG_NAME: &str = "tierlist";
const ENV_PREFIX: &str = "TIERLIST_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierlistConfig {
    pub data_dir: PathBuf,
    pub catalog: CatalogSettings,
    pub persistence: PersistenceSettings,
    pub search: SearchSettings,
    pub history: HistorySettings,
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub debounce_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub limit: usize,
}

impl Default for TierlistConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join(CONFIG_NAME))
            .unwrap_or_else(|| PathBuf::from(".tierlist").join("data"));
        Self {
            data_dir,
            catalog: CatalogSettings::default(),
            persistence: PersistenceSettings::default(),
            search: SearchSettings::default(),
            history: HistorySettings::default(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787/api".to_string(),
            timeout_secs: 15,
            max_retries: 2,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            cache_ttl_secs: 60,
            cache_capacity: 128,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

/// Where configuration files are looked up
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub global_dir: Option<PathBuf>,
    pub project_dir: Option<PathBuf>,
}

impl ConfigSources {
    /// `~/.config/tierlist` and `./.tierlist`
    pub fn discover() -> Self {
        Self {
            global_dir: dirs::config_dir().map(|dir| dir.join(CONFIG_NAME)),
            project_dir: std::env::current_dir()
                .ok()
                .map(|dir| dir.join(format!(".{CONFIG_NAME}"))),
        }
    }
}

impl TierlistConfig {
    /// Load from the standard locations
    pub fn load() -> Result<Self> {
        Self::load_from(&ConfigSources::discover())
    }

    pub fn load_from(sources: &ConfigSources) -> Result<Self> {
        let config: Self = Self::figment(sources).extract()?;
        debug!(data_dir = %config.data_dir.display(), "configuration loaded");
        Ok(config)
    }

    /// All sources in precedence order
    pub fn figment(sources: &ConfigSources) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        for dir in [&sources.global_dir, &sources.project_dir].into_iter().flatten() {
            figment = merge_files(figment, dir);
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn palette(&self) -> Palette {
        Palette::new(self.palette.iter().map(String::as_str))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.catalog.max_retries,
            Duration::from_millis(self.catalog.retry_delay_ms),
        )
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.timeout_secs)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persistence.debounce_ms)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            debounce: Duration::from_millis(self.search.debounce_ms),
            cache_ttl: Duration::from_secs(self.search.cache_ttl_secs),
            cache_capacity: self.search.cache_capacity,
            retry: self.retry_policy(),
            persist_debounce: self.persist_debounce(),
        }
    }
}

fn merge_files(mut figment: Figment, dir: &Path) -> Figment {
    for ext in ["toml", "yaml", "yml", "json"] {
        let path = dir.join(format!("{CONFIG_NAME}.{ext}"));
        if !path.is_file() {
            continue;
        }
        trace!(path = %path.display(), "loading config file");
        figment = match ext {
            "toml" => figment.merge(Toml::file(path)),
            "json" => figment.merge(Json::file(path)),
            _ => figment.merge(Yaml::file(path)),
        };
    }
    figment
}
