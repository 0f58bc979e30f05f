use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::price::DEFAULT_PRICE_URL;

pub const DEFAULT_RPC: &str = "https://ethereum-rpc.publicnode.com";
pub const DEFAULT_TITLE: &str = "Address Tracker";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub group_size: usize,
    pub delay_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            group_size: 5,
            delay_ms: 1000,
        }
    }
}

impl QueryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub url: String,
    pub asset: String,
    pub fiat: String,
    pub symbol: String,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PRICE_URL.to_string(),
            asset: "ethereum".to_string(),
            fiat: "cny".to_string(),
            symbol: "¥".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub page_size: usize,
    pub title: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: crate::domain::DEFAULT_PAGE_SIZE,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
    pub query: QueryConfig,
    pub price: PriceConfig,
    pub table: TableConfig,
    pub toast_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: None,
            ws: None,
            ipc: None,
            query: QueryConfig::default(),
            price: PriceConfig::default(),
            table: TableConfig::default(),
            toast_secs: 3,
        }
    }
}

impl Config {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_secs.max(1))
    }
}

pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => Config::default(),
    }
}

/// A missing or malformed file yields defaults; the parse error is logged
pub fn load_from(path: &Path) -> Config {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match parse(&content) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("ignoring malformed config {}: {}", path.display(), err);
            Config::default()
        }
    }
}

pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("TALLY_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("tally").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("tally").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "tally", "tally")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("tally"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("tally"));
    }
    directories::ProjectDirs::from("io", "tally", "tally")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Files kept under the data directory
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn db(&self) -> PathBuf {
        self.root.join("tally.sqlite3")
    }

    pub fn log(&self) -> PathBuf {
        self.root.join("tally.log")
    }

    pub fn exports(&self) -> PathBuf {
        self.root.join("exports")
    }
}
