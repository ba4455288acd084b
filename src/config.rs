use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_CONTROLS_HIDE_MS: u64 = 3000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration
/// In debug builds: loads from .env file
/// In release builds: loads from ~/.config/vidshare/config.env
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the remote video service API
    pub api_base_url: String,
    /// How long the controls overlay stays up before auto-hiding
    pub controls_hide_delay: Duration,
    /// Whether the player starts playing as soon as the source loads
    pub autoplay: bool,
    /// Per-request timeout for remote calls
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            controls_hide_delay: Duration::from_millis(DEFAULT_CONTROLS_HIDE_MS),
            autoplay: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration based on build mode
    pub fn load() -> Self {
        #[cfg(debug_assertions)]
        {
            if dotenvy::dotenv().is_ok() {
                tracing::info!("Config: Dev mode activated - loaded .env file");
            } else {
                tracing::info!("Config: No .env file found, using environment only");
            }
        }

        #[cfg(not(debug_assertions))]
        {
            if let Some(path) = Self::config_file_path() {
                match dotenvy::from_path(&path) {
                    Ok(()) => tracing::info!("Config: loaded {}", path.display()),
                    Err(e) => tracing::debug!("Config: {} not loaded: {}", path.display(), e),
                }
            }
        }

        Self::from_env()
    }

    /// Build configuration from `VIDSHARE_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("VIDSHARE_API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_base_url);

        let controls_hide_delay = parse_var(&lookup, "VIDSHARE_CONTROLS_HIDE_MS", |v| {
            v.parse::<u64>().ok()
        })
        .map(Duration::from_millis)
        .unwrap_or(defaults.controls_hide_delay);

        let autoplay = parse_var(&lookup, "VIDSHARE_AUTOPLAY", |v| {
            match v.to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            }
        })
        .unwrap_or(defaults.autoplay);

        let request_timeout = parse_var(&lookup, "VIDSHARE_REQUEST_TIMEOUT_SECS", |v| {
            v.parse::<u64>().ok()
        })
        .map(Duration::from_secs)
        .unwrap_or(defaults.request_timeout);

        Self {
            api_base_url,
            controls_hide_delay,
            autoplay,
            request_timeout,
        }
    }

    /// Location of the release-mode config file
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vidshare").join("config.env"))
    }
}

/// Read and parse one variable. A value that is set but rejected by
/// `parse` is logged and treated as unset.
fn parse_var<F, T>(lookup: &F, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        tracing::warn!("Config: ignoring {}={:?}, using default", key, raw);
    }
    parsed
}
