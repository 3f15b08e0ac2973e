use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use url::Url;

/// The main configuration structure for Trading Post client applications.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the Trading Post HTTP service
    pub api_base_url: Url,

    /// Logging level
    pub log_level: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Partial configuration as read from a TOML file; absent keys fall back to
/// the defaults.
#[derive(Deserialize, Debug, Default)]
struct FileConfig {
    api_base_url: Option<Url>,
    log_level: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Generates a default configuration.
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: Url::parse("http://localhost:3000").expect("default URL is valid"),
            log_level: "info".to_string(),
            request_timeout_secs: 30,
        }
    }

    /// Loads the configuration from a file, environment variables, or
    /// defaults, in increasing order of precedence.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML configuration file. When
    ///   absent, the platform config directory is consulted and silently
    ///   skipped if no file exists there.
    ///
    /// # Returns
    /// A [`ClientConfig`] with all values resolved, or an error if loading
    /// fails.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = ClientConfig::with_defaults();

        let path = match config_path {
            Some(path) => Some(path),
            None => Self::default_path().filter(|p| p.exists()),
        };

        if let Some(path) = path {
            let content = fs::read_to_string(&path)?;
            let file_config: FileConfig = toml::from_str(&content)?;

            if let Some(api_base_url) = file_config.api_base_url {
                config.api_base_url = api_base_url;
            }
            if let Some(log_level) = file_config.log_level {
                config.log_level = log_level;
            }
            if let Some(request_timeout_secs) = file_config.request_timeout_secs {
                config.request_timeout_secs = request_timeout_secs;
            }
        }

        if let Ok(api_url) = env::var("TRADINGPOST_API_URL") {
            config.api_base_url = Url::parse(&api_url)
                .map_err(|_| "Invalid TRADINGPOST_API_URL value: must be an absolute URL")?;
        }
        if let Ok(log_level) = env::var("TRADINGPOST_LOG_LEVEL") {
            config.log_level = log_level;
        }
        if let Ok(timeout) = env::var("TRADINGPOST_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = timeout.parse().map_err(|_| {
                "Invalid TRADINGPOST_REQUEST_TIMEOUT_SECS value: must be a whole number of seconds"
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Default location of the configuration file inside the platform config
    /// directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tradingpost", "TradingPost")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn default_path() -> Option<PathBuf> {
        None
    }

    /// Validate the resolved configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self.api_base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(format!(
                    "Unsupported API URL scheme '{other}'. Use 'http' or 'https'."
                ));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err("Invalid request timeout. Must be greater than 0.".to_string());
        }

        Ok(())
    }
}
