use serde::{Deserialize, Serialize};

/// Name of the system-wide lock used to detect a running instance. The GUID
/// suffix keeps it unique across unrelated applications.
pub const DEFAULT_INSTANCE_LOCK_NAME: &str =
    "Winhance_SingleInstance_Mutex_{B8F3E4D1-9A7C-4F2E-8D6B-1C3A5E7F9B2D}";

/// Release feed queried by the default version service.
pub const DEFAULT_RELEASE_FEED_URL: &str =
    "https://api.github.com/repos/memstechtips/Winhance/releases/latest";

/// Settings for single-instance enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Name of the OS-level lock shared by every instance.
    pub lock_name: String,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            lock_name: DEFAULT_INSTANCE_LOCK_NAME.to_string(),
        }
    }
}

/// Settings for the privilege check performed before any UI appears.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Whether the application relaunches itself with administrative rights
    /// when started without them.
    pub required: bool,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            required: cfg!(windows),
        }
    }
}

/// Settings for the post-startup update check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Whether the update check runs at all.
    pub enabled: bool,
    /// Endpoint returning the latest release as JSON.
    pub release_feed_url: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            release_feed_url: DEFAULT_RELEASE_FEED_URL.to_string(),
        }
    }
}

/// Settings for string lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalizationConfig {
    /// Language applied when the user has not chosen one yet.
    pub default_language: String,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
        }
    }
}

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub instance: InstanceConfig,
    pub elevation: ElevationConfig,
    pub updates: UpdateConfig,
    pub localization: LocalizationConfig,
}
