use crate::error::{Result, UnpostError};
use crate::io::read_optional;
use crate::paths;
use crate::source::DiscoveryOptions;
use crate::types::Backend;
use crate::usage::UsageLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Smallest page size the timeline endpoint accepts.
pub const MIN_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Resolved through the API when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_base_url() -> String {
    x_client::DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    x_client::MAX_PAGE_SIZE
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_id: None,
            page_size: default_page_size(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// The signed-in user's own profile page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    /// Attach to this already-open WebDriver session instead of starting one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_min_wait_ms")]
    pub min_wait_ms: u64,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    /// Session capabilities, sent as `alwaysMatch`. The browser profile that
    /// holds the signed-in account is selected here.
    #[serde(default = "default_capabilities")]
    pub capabilities: serde_json::Value,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_min_wait_ms() -> u64 {
    800
}

fn default_max_wait_ms() -> u64 {
    2500
}

fn default_capabilities() -> serde_json::Value {
    serde_json::json!({ "browserName": "chrome" })
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            profile_url: None,
            session_id: None,
            max_retries: default_max_retries(),
            min_wait_ms: default_min_wait_ms(),
            max_wait_ms: default_max_wait_ms(),
            capabilities: default_capabilities(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub limits: UsageLimits,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub discovery: DiscoveryOptions,
}

impl Config {
    /// Load `.unpost/config.yaml`, or defaults when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let Some(data) = read_optional(&path)? else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        };
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if !(MIN_PAGE_SIZE..=x_client::MAX_PAGE_SIZE).contains(&self.api.page_size) {
            error(format!(
                "api.page_size {} is outside {}..={}",
                self.api.page_size,
                MIN_PAGE_SIZE,
                x_client::MAX_PAGE_SIZE
            ));
        }
        if self.ui.min_wait_ms > self.ui.max_wait_ms {
            error(format!(
                "ui.min_wait_ms ({}) is greater than ui.max_wait_ms ({})",
                self.ui.min_wait_ms, self.ui.max_wait_ms
            ));
        }
        if self.discovery.min_batch == 0 {
            error("discovery.min_batch must be at least 1".to_string());
        }
        if !self.ui.capabilities.is_object() {
            error("ui.capabilities must be a mapping".to_string());
        }
        if self.backend == Backend::Ui && self.ui.profile_url.is_none() {
            error("ui backend requires ui.profile_url (or UNPOST_PROFILE_URL)".to_string());
        }

        if self.limits.daily == Some(0) || self.limits.monthly == Some(0) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "a usage limit of 0 stops every api run before its first call"
                    .to_string(),
            });
        }
        if self.backend == Backend::Ui && self.ui.max_wait_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "ui waits are disabled; actions will not be human-paced".to_string(),
            });
        }

        warnings
    }

    /// Fail on the first `Error` level warning. `Warning` level entries are
    /// logged and otherwise ignored.
    pub fn ensure_valid(&self) -> Result<()> {
        let warnings = self.validate();
        for w in warnings.iter().filter(|w| w.level == WarnLevel::Warning) {
            tracing::warn!(warning = %w.message, "Config warning");
        }
        match warnings.into_iter().find(|w| w.level == WarnLevel::Error) {
            Some(w) => Err(UnpostError::Config(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
