use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub editor: EditorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection to the back-office REST API that owns roles and rights
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://erp.local/api` (the `/Role/...` paths are appended)
    pub base_url: String,
    /// Request timeout in seconds (accepts "30s", "2m")
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
    /// Bearer token forwarded on every backend call
    pub api_token: Option<String>,
    /// Page size used when listing roles for a new editor session
    pub role_page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Idle editor sessions older than this are dropped (default: 2h)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub session_ttl_secs: u64,
    /// How often idle sessions are swept (default: 5m)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rights-desk")]
#[command(version, about = "Rights Desk - role rights editor service")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Rights backend base URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Rights backend request timeout (overrides config file, e.g., "30s")
    #[arg(long, value_name = "DURATION")]
    pub backend_timeout: Option<String>,

    /// Logging level (overrides config file, e.g., "info,rights_desk=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Idle editor session lifetime (overrides config file, e.g., "2h")
    #[arg(long, value_name = "DURATION")]
    pub session_ttl: Option<String>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (config.toml)
    /// 3. Environment variables (prefixed with APP_)
    /// 4. Command line arguments
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();
        Self::load_with(&cli_args)
    }

    pub fn load_with(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_BACKEND_URL: Rights backend base URL
    /// - APP_BACKEND_TIMEOUT: Backend request timeout (accepts "30s", "2m")
    /// - APP_BACKEND_TOKEN: Bearer token for the backend
    /// - APP_ROLE_PAGE_SIZE: Page size for role listing
    /// - APP_SESSION_TTL: Idle editor session lifetime (accepts "30m", "2h")
    /// - APP_LOG_LEVEL: Logging level
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(url) = std::env::var("APP_BACKEND_URL") {
            self.backend.base_url = url;
            tracing::info!("Override backend.base_url from env: {}", self.backend.base_url);
        }

        if let Ok(timeout) = std::env::var("APP_BACKEND_TIMEOUT") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.backend.timeout_secs = val;
                    tracing::info!(
                        "Override backend.timeout_secs from env: {}",
                        self.backend.timeout_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_BACKEND_TIMEOUT '{}': {} (keep {})",
                    timeout,
                    e,
                    self.backend.timeout_secs
                ),
            }
        }

        if let Ok(token) = std::env::var("APP_BACKEND_TOKEN") {
            self.backend.api_token = Some(token);
            tracing::info!("Override backend.api_token from env");
        }

        if let Ok(size) = std::env::var("APP_ROLE_PAGE_SIZE")
            && let Ok(size) = size.parse()
        {
            self.backend.role_page_size = size;
            tracing::info!(
                "Override backend.role_page_size from env: {}",
                self.backend.role_page_size
            );
        }

        if let Ok(ttl) = std::env::var("APP_SESSION_TTL") {
            match parse_duration_to_secs(&ttl) {
                Ok(val) => {
                    self.editor.session_ttl_secs = val;
                    tracing::info!(
                        "Override editor.session_ttl_secs from env: {}",
                        self.editor.session_ttl_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_SESSION_TTL '{}': {} (keep {})",
                    ttl,
                    e,
                    self.editor.session_ttl_secs
                ),
            }
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(url) = &args.backend_url {
            self.backend.base_url = url.clone();
            tracing::info!("Override backend.base_url from CLI: {}", self.backend.base_url);
        }

        if let Some(timeout) = &args.backend_timeout {
            match parse_duration_to_secs(timeout) {
                Ok(val) => {
                    self.backend.timeout_secs = val;
                    tracing::info!(
                        "Override backend.timeout_secs from CLI: {}",
                        self.backend.timeout_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid --backend-timeout '{}': {} (keep {})",
                    timeout,
                    e,
                    self.backend.timeout_secs
                ),
            }
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(ttl) = &args.session_ttl {
            match parse_duration_to_secs(ttl) {
                Ok(val) => {
                    self.editor.session_ttl_secs = val;
                    tracing::info!(
                        "Override editor.session_ttl_secs from CLI: {}",
                        self.editor.session_ttl_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid --session-ttl '{}': {} (keep {})",
                    ttl,
                    e,
                    self.editor.session_ttl_secs
                ),
            }
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.backend.base_url.trim().is_empty() {
            anyhow::bail!("backend.base_url cannot be empty");
        }
        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend.timeout_secs must be > 0");
        }
        if self.backend.role_page_size == 0 {
            anyhow::bail!("backend.role_page_size must be > 0");
        }

        if self.editor.session_ttl_secs == 0 {
            anyhow::bail!("editor.session_ttl_secs must be > 0");
        }
        if self.editor.sweep_interval_secs == 0 {
            anyhow::bail!("editor.sweep_interval_secs must be > 0");
        }

        if self.backend.api_token.is_none() {
            tracing::warn!("No backend API token configured; calls are sent unauthenticated");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
            api_token: None,
            role_page_size: 1000,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { session_ttl_secs: 2 * 60 * 60, sweep_interval_secs: 5 * 60 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,rights_desk=debug".to_string(), file: Some("logs/rights-desk.log".to_string()) }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Plain numbers are seconds
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        "d" | "day" | "days" => Ok(n * 60 * 60 * 24),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Accepts a number of seconds or a human-friendly string
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
