//! Configuration types for fanfold

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::ParentId;

/// Placeholder substituted with the parent id in [`SourceConfig::children_path`]
pub const ID_PLACEHOLDER: &str = "{id}";

/// Remote source configuration (where the listing and sub-resources live)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the API (default: "https://jsonplaceholder.typicode.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the parent listing, relative to `base_url` (default: "posts")
    #[serde(default = "default_parents_path")]
    pub parents_path: String,

    /// Path of one parent's sub-resource, relative to `base_url` (default: "posts/{id}/comments")
    ///
    /// Must contain the `{id}` placeholder.
    #[serde(default = "default_children_path")]
    pub children_path: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            parents_path: default_parents_path(),
            children_path: default_children_path(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourceConfig {
    /// Check the source settings for values that cannot work at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("source.base_url", "base URL must not be empty"));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::config("source.base_url", format!("invalid base URL: {}", e))
        })?;
        if !self.children_path.contains(ID_PLACEHOLDER) {
            return Err(Error::config(
                "source.children_path",
                format!("children path must contain the {} placeholder", ID_PLACEHOLDER),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config(
                "source.request_timeout",
                "request timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Path of the sub-resource for `id`, relative to the base URL.
    pub fn children_path_for(&self, id: ParentId) -> String {
        self.children_path.replace(ID_PLACEHOLDER, &id.to_string())
    }
}

/// Fan-out engine behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Drop parents whose id was already seen in the listing (default: true)
    ///
    /// With duplicates left in, each copy is dispatched and their outcomes are merged
    /// under the single shared key. If any copy fails, the key is recorded as failed
    /// with no children.
    #[serde(default = "default_true")]
    pub dedupe_parents: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dedupe_parents: true,
        }
    }
}

/// Main configuration for fanfold
///
/// - [`source`](SourceConfig) - remote API location and request behavior
/// - [`engine`](EngineConfig) - fan-out/fan-in behavior
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Check the configuration for values that cannot work at runtime.
    pub fn validate(&self) -> Result<()> {
        self.source.validate()
    }
}

fn default_base_url() -> String {
    "https://jsonplaceholder.typicode.com".to_string()
}

fn default_parents_path() -> String {
    "posts".to_string()
}

fn default_children_path() -> String {
    "posts/{id}/comments".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("fanfold/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
