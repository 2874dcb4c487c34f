//! Configuration for spoofscan-analyzer
//!
//! Bootstrap settings come from a TOML file resolved through
//! [`spoofscan_common::config::ConfigResolver`], then a few environment
//! variables and command-line flags override individual values:
//!
//! 1. Command-line arguments (`--port`, `--bind`)
//! 2. Environment variables (`SPOOFSCAN_PORT`, `SPOOFSCAN_STORE_ROOT`, `SPOOFSCAN_STORE_ENDPOINT`)
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! Configuration cannot change while the service runs.

use serde::Deserialize;
use spoofscan_common::config::LoggingConfig;
use spoofscan_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::CodecHint;
use crate::scoring::energy::EnergyScorerConfig;

/// Env var naming the config file
pub const CONFIG_ENV_VAR: &str = "SPOOFSCAN_CONFIG";
/// Config file name looked up in the standard locations
pub const CONFIG_FILE_NAME: &str = "analyzer.toml";

pub const PORT_ENV_VAR: &str = "SPOOFSCAN_PORT";
pub const STORE_ROOT_ENV_VAR: &str = "SPOOFSCAN_STORE_ROOT";
pub const STORE_ENDPOINT_ENV_VAR: &str = "SPOOFSCAN_STORE_ENDPOINT";

/// Upper bound on the default worker count
const MAX_DEFAULT_WORKERS: usize = 10;
const MAX_SCORE_PRECISION: u32 = 9;

/// Complete analyzer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Address to bind the HTTP server to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub scorer: EnergyScorerConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            analysis: AnalysisConfig::default(),
            scorer: EnergyScorerConfig::default(),
        }
    }
}

/// Object store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Buckets are directories under `root`
    Fs,
    /// S3-compatible HTTP endpoint, path-style addressing
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Root directory for the `fs` backend
    #[serde(default = "default_store_root")]
    pub root: PathBuf,

    /// Base URL for the `http` backend
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout for the `http` backend
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,

    /// Probe bucket existence before fetching
    #[serde(default = "default_true")]
    pub check_bucket: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: default_store_root(),
            endpoint: None,
            timeout_secs: default_store_timeout_secs(),
            check_bucket: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a staged frame
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Interval between purges of expired entries
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Delete a request's staged frames once scoring finishes
    #[serde(default)]
    pub evict_after_scoring: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            evict_after_scoring: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Target sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frame duration in seconds
    #[serde(default = "default_frame_seconds")]
    pub frame_seconds: u32,

    /// Concurrent scoring workers (default: available parallelism, at most 10)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Decimal places kept in scores
    #[serde(default = "default_score_precision")]
    pub score_precision: u32,

    /// End-to-end deadline for one request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional limit on a single frame's scoring time
    #[serde(default)]
    pub frame_timeout_secs: Option<u64>,

    /// Container readers tried in order
    #[serde(default = "default_codec_hints")]
    pub codec_hints: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_seconds: default_frame_seconds(),
            workers: default_workers(),
            score_precision: default_score_precision(),
            request_timeout_secs: default_request_timeout_secs(),
            frame_timeout_secs: None,
            codec_hints: default_codec_hints(),
        }
    }
}

impl AnalysisConfig {
    /// Samples per frame
    pub fn frame_len(&self) -> usize {
        self.sample_rate as usize * self.frame_seconds as usize
    }

    /// Parsed codec hints in configured order
    pub fn parsed_codec_hints(&self) -> Result<Vec<CodecHint>> {
        self.codec_hints
            .iter()
            .map(|h| {
                h.parse::<CodecHint>()
                    .map_err(|e| Error::Config(format!("analysis.codec_hints: {}", e)))
            })
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_secs.map(Duration::from_secs)
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5750
}

fn default_backend() -> StoreBackend {
    StoreBackend::Fs
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_store_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_frame_seconds() -> u32 {
    4
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

fn default_score_precision() -> u32 {
    4
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_codec_hints() -> Vec<String> {
    CodecHint::DEFAULT_ORDER
        .iter()
        .map(|h| h.to_string())
        .collect()
}

impl AnalyzerConfig {
    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var(PORT_ENV_VAR) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} is not a valid port: {}", PORT_ENV_VAR, port)))?;
        }
        if let Ok(root) = std::env::var(STORE_ROOT_ENV_VAR) {
            self.store.root = PathBuf::from(root);
        }
        if let Ok(endpoint) = std::env::var(STORE_ENDPOINT_ENV_VAR) {
            self.store.endpoint = Some(endpoint);
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if analysis.sample_rate == 0 {
            return Err(Error::Config("analysis.sample_rate must be positive".to_string()));
        }
        if analysis.frame_seconds == 0 {
            return Err(Error::Config("analysis.frame_seconds must be positive".to_string()));
        }
        if analysis.workers == 0 {
            return Err(Error::Config("analysis.workers must be at least 1".to_string()));
        }
        if analysis.score_precision > MAX_SCORE_PRECISION {
            return Err(Error::Config(format!(
                "analysis.score_precision must be at most {}",
                MAX_SCORE_PRECISION
            )));
        }
        if analysis.request_timeout_secs == 0 {
            return Err(Error::Config(
                "analysis.request_timeout_secs must be positive".to_string(),
            ));
        }
        if analysis.frame_timeout_secs == Some(0) {
            return Err(Error::Config(
                "analysis.frame_timeout_secs must be positive when set".to_string(),
            ));
        }
        if analysis.codec_hints.is_empty() {
            return Err(Error::Config("analysis.codec_hints must not be empty".to_string()));
        }
        analysis.parsed_codec_hints()?;

        if self.cache.ttl_secs == 0 {
            return Err(Error::Config("cache.ttl_secs must be positive".to_string()));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(Error::Config("cache.sweep_interval_secs must be positive".to_string()));
        }

        if self.store.backend == StoreBackend::Http && self.store.endpoint.is_none() {
            return Err(Error::Config(
                "store.endpoint is required for the http backend".to_string(),
            ));
        }
        Ok(())
    }
}
