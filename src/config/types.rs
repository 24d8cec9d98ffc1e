use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8888
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Location of the EPG service that resolves program tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_catalog_port")]
    pub port: u16,

    /// Connect timeout for catalog lookups, in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

fn default_catalog_port() -> u16 {
    8889
}
fn default_connect_timeout() -> u64 {
    2000
}

impl CatalogConfig {
    /// Base URL of the catalog service, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_catalog_port(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

/// How worker processes are launched.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Worker executable
    #[serde(default = "default_worker_program")]
    pub program: PathBuf,

    /// Arguments placed before the per-request arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// How long a fresh worker must stay alive to count as started, in milliseconds
    #[serde(default = "default_readiness_window")]
    pub readiness_window_ms: u64,
}

fn default_worker_program() -> PathBuf {
    PathBuf::from("/app/u7d.py")
}
fn default_readiness_window() -> u64 {
    300
}

impl WorkerConfig {
    pub fn readiness_window(&self) -> Duration {
        Duration::from_millis(self.readiness_window_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: default_worker_program(),
            args: Vec::new(),
            readiness_window_ms: default_readiness_window(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Address the per-request UDP listeners bind to
    #[serde(default = "default_relay_host")]
    pub host: String,

    /// Multicast proxy prefix; the multicast token is appended verbatim
    #[serde(default = "default_multicast_base_url")]
    pub multicast_base_url: String,
}

fn default_relay_host() -> String {
    "0.0.0.0".to_string()
}
fn default_multicast_base_url() -> String {
    "http://192.168.137.1:4022/rtp/".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            multicast_base_url: default_multicast_base_url(),
        }
    }
}

/// Channel list and guide files served as-is.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesConfig {
    #[serde(default = "default_home_dir")]
    pub home_dir: PathBuf,

    #[serde(default = "default_channels_file")]
    pub channels_file: String,

    #[serde(default = "default_guide_file")]
    pub guide_file: String,
}

fn default_home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/home/"))
}
fn default_channels_file() -> String {
    "MovistarTV.m3u".to_string()
}
fn default_guide_file() -> String {
    "guide.xml".to_string()
}

impl FilesConfig {
    pub fn channels_path(&self) -> PathBuf {
        self.home_dir.join(&self.channels_file)
    }

    pub fn guide_path(&self) -> PathBuf {
        self.home_dir.join(&self.guide_file)
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            home_dir: default_home_dir(),
            channels_file: default_channels_file(),
            guide_file: default_guide_file(),
        }
    }
}
