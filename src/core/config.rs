use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use super::instrument::{InstrumentRef, Market};
use super::proxy::{ProxyEntry, ProxyMapping};

pub const API_KEY_ENV: &str = "QUOTEBATCH_API_KEY";
pub const ACCESS_TOKEN_ENV: &str = "QUOTEBATCH_ACCESS_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://quotes.example.com".to_string(),
            api_key: None,
            access_token: None,
        }
    }
}

/// Throughput tuning for the upstream rate ceiling.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BatchConfig {
    pub chunk_size: usize,
    pub inter_chunk_delay_ms: u64,
    pub call_timeout_ms: u64,
    pub batch_timeout_ms: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            chunk_size: 10,
            inter_chunk_delay_ms: 1000,
            call_timeout_ms: 10_000,
            batch_timeout_ms: Some(120_000),
        }
    }
}

impl BatchConfig {
    pub fn inter_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.inter_chunk_delay_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProxyConfig {
    pub index: InstrumentRef,
    pub proxy: InstrumentRef,
    pub multiplier: Decimal,
    pub label: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CategoryConfig {
    pub name: String,
    pub instruments: Vec<InstrumentRef>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_proxies")]
    pub proxies: Vec<ProxyConfig>,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
    #[serde(default = "default_indices")]
    pub indices: Vec<InstrumentRef>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            provider: ProviderConfig::default(),
            batch: BatchConfig::default(),
            server: ServerConfig::default(),
            proxies: default_proxies(),
            categories: default_categories(),
            indices: default_indices(),
        }
    }
}

fn default_proxies() -> Vec<ProxyConfig> {
    [
        ("NDX", "QQQ", Market::Nasdaq, 35, "NASDAQ 100 (est. via QQQ)"),
        ("SPX", "SPY", Market::Nyse, 10, "S&P 500 (est. via SPY)"),
        ("DJI", "DIA", Market::Nyse, 100, "Dow Jones (est. via DIA)"),
        ("RUT", "IWM", Market::Nyse, 10, "Russell 2000 (est. via IWM)"),
    ]
    .into_iter()
    .map(|(index, proxy, market, multiplier, label)| ProxyConfig {
        index: InstrumentRef::index(index, market),
        proxy: InstrumentRef::equity(proxy, market),
        multiplier: Decimal::from(multiplier),
        label: label.to_string(),
    })
    .collect()
}

fn default_categories() -> Vec<CategoryConfig> {
    let category = |name: &str, symbols: &[(&str, Market)]| CategoryConfig {
        name: name.to_string(),
        instruments: symbols
            .iter()
            .map(|(symbol, market)| InstrumentRef::equity(symbol, *market))
            .collect(),
    };
    vec![
        category(
            "index-etf",
            &[
                ("SPY", Market::Nyse),
                ("QQQ", Market::Nasdaq),
                ("DIA", Market::Nyse),
                ("IWM", Market::Nyse),
            ],
        ),
        category(
            "sector",
            &[
                ("XLK", Market::Nyse),
                ("XLF", Market::Nyse),
                ("XLE", Market::Nyse),
                ("XLV", Market::Nyse),
                ("XLY", Market::Nyse),
                ("XLI", Market::Nyse),
            ],
        ),
        category(
            "bond",
            &[
                ("TLT", Market::Nasdaq),
                ("IEF", Market::Nasdaq),
                ("SHY", Market::Nasdaq),
                ("AGG", Market::Nyse),
            ],
        ),
    ]
}

fn default_indices() -> Vec<InstrumentRef> {
    vec![
        InstrumentRef::index("SPX", Market::Nyse),
        InstrumentRef::index("NDX", Market::Nasdaq),
        InstrumentRef::index("DJI", Market::Nyse),
        InstrumentRef::index("RUT", Market::Nyse),
    ]
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "quotebatch", "quotebatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.apply_env_overrides();
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            debug!("Using API key from {API_KEY_ENV}");
            self.provider.api_key = Some(key);
        }
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            debug!("Using access token from {ACCESS_TOKEN_ENV}");
            self.provider.access_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.chunk_size == 0 {
            bail!("batch.chunk_size must be greater than zero");
        }
        if self.batch.call_timeout_ms == 0 {
            bail!("batch.call_timeout_ms must be greater than zero");
        }
        if self.batch.batch_timeout_ms == Some(0) {
            bail!("batch.batch_timeout_ms must be greater than zero, or null to disable");
        }
        for proxy in &self.proxies {
            if proxy.multiplier <= Decimal::ZERO {
                bail!(
                    "Proxy multiplier for {} must be positive, got {}",
                    proxy.index,
                    proxy.multiplier
                );
            }
        }
        Ok(())
    }

    pub fn proxy_mapping(&self) -> ProxyMapping {
        ProxyMapping::new(self.proxies.iter().map(|p| {
            (
                p.index.clone(),
                ProxyEntry {
                    proxy: p.proxy.clone(),
                    multiplier: p.multiplier,
                    label: p.label.clone(),
                },
            )
        }))
    }
}
