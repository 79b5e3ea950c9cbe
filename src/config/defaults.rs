/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

// Upstream defaults
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "20s";
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const DEFAULT_READ_TIMEOUT: &str = "30s";
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

// Keepalive defaults
pub const DEFAULT_KEEPALIVE_INTERVAL: &str = "4m";

// Download defaults
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "download";
pub const DEFAULT_ENFORCE_MEDIA_GATE: bool = false;

// Legacy flat environment variables
pub const ENV_PORT: &str = "PORT";
pub const ENV_USER_AGENT: &str = "REQUEST_UA";
pub const ENV_SELF_URL: &str = "SELF_URL";
pub const ENV_PREFIX: &str = "MEDIA_RESOLVER_";
