use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;

use crate::errors::{AppError, AppResult};
use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding a prebuilt frontend bundle, served as the fallback route
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

/// Settings for every outbound request made on behalf of a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Identity header sent as `User-Agent`
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Sent with page fetches only
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Total deadline for page fetches and probes (not downloads)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
    /// Inactivity deadline between body reads, bounds stalled downloads
    #[serde(default = "default_read_timeout")]
    pub read_timeout: String,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Page bodies are scanned up to this many bytes; the rest is never read
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    /// Base URL of this deployment; keepalive is disabled when unset
    #[serde(default)]
    pub self_url: Option<String>,
    #[serde(default = "default_keepalive_interval")]
    pub interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Apply the content-type gate inside the download proxy as well
    #[serde(default = "default_enforce_media_gate")]
    pub enforce_media_gate: bool,
    /// Used when the requested filename sanitizes to nothing
    #[serde(default = "default_download_filename")]
    pub default_filename: String,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_language() -> String {
    DEFAULT_ACCEPT_LANGUAGE.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

fn default_connect_timeout() -> String {
    DEFAULT_CONNECT_TIMEOUT.to_string()
}

fn default_read_timeout() -> String {
    DEFAULT_READ_TIMEOUT.to_string()
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

fn default_max_page_bytes() -> usize {
    DEFAULT_MAX_PAGE_BYTES
}

fn default_keepalive_interval() -> String {
    DEFAULT_KEEPALIVE_INTERVAL.to_string()
}

fn default_enforce_media_gate() -> bool {
    DEFAULT_ENFORCE_MEDIA_GATE
}

fn default_download_filename() -> String {
    DEFAULT_DOWNLOAD_FILENAME.to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            max_redirects: default_max_redirects(),
            max_page_bytes: default_max_page_bytes(),
        }
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            self_url: None,
            interval: default_keepalive_interval(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            enforce_media_gate: default_enforce_media_gate(),
            default_filename: default_download_filename(),
        }
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> AppResult<Duration> {
        parse_duration("upstream.request_timeout", &self.request_timeout)
    }

    pub fn connect_timeout(&self) -> AppResult<Duration> {
        parse_duration("upstream.connect_timeout", &self.connect_timeout)
    }

    pub fn read_timeout(&self) -> AppResult<Duration> {
        parse_duration("upstream.read_timeout", &self.read_timeout)
    }
}

impl KeepaliveConfig {
    pub fn interval(&self) -> AppResult<Duration> {
        let interval = parse_duration("keepalive.interval", &self.interval)?;
        if interval.is_zero() {
            return Err(AppError::configuration(
                "keepalive.interval must be greater than zero",
            ));
        }
        Ok(interval)
    }

    /// Configured keepalive target, ignoring blank values
    pub fn target(&self) -> Option<&str> {
        self.self_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

fn parse_duration(field: &str, value: &str) -> AppResult<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| AppError::configuration(format!("{field}: invalid duration '{value}': {e}")))
}

impl Config {
    /// Layer defaults, an optional TOML file and the environment.
    ///
    /// Precedence, lowest first: built-in defaults, the TOML file (skipped when
    /// missing), `MEDIA_RESOLVER_*` variables (`__` separates sections), then the
    /// flat `PORT`, `REQUEST_UA` and `SELF_URL` variables.
    pub fn load_from_file(config_file: &str) -> AppResult<Self> {
        if Path::new(config_file).exists() {
            info!("Loading configuration from: {}", config_file);
        }

        let config: Config = Self::figment(config_file)
            .extract()
            .map_err(|e| AppError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&[ENV_PORT]).map(|_| "web.port".into()))
            .merge(
                Env::raw()
                    .only(&[ENV_USER_AGENT])
                    .map(|_| "upstream.user_agent".into()),
            )
            .merge(
                Env::raw()
                    .only(&[ENV_SELF_URL])
                    .map(|_| "keepalive.self_url".into()),
            )
    }

    /// Reject values that would only fail later, at first use
    pub fn validate(&self) -> AppResult<()> {
        self.upstream.request_timeout()?;
        self.upstream.connect_timeout()?;
        self.upstream.read_timeout()?;
        self.keepalive.interval()?;

        if self.upstream.max_page_bytes == 0 {
            return Err(AppError::configuration(
                "upstream.max_page_bytes must be greater than zero",
            ));
        }
        if self.upstream.user_agent.trim().is_empty() {
            return Err(AppError::configuration("upstream.user_agent must not be empty"));
        }
        if let Some(target) = self.keepalive.target()
            && !crate::utils::url::UrlUtils::is_http_url(target)
        {
            return Err(AppError::configuration(format!(
                "keepalive.self_url must be an http(s) URL, got '{target}'"
            )));
        }
        Ok(())
    }
}
