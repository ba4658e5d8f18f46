use std::env;
use std::time::Duration;

use crate::entitlement::{DEFAULT_TRIAL_HOURS, PolicyKind};
use crate::error::{PropError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Provider credentials and call limits. Built once per process and handed to
/// the inference gateway; nothing reads the environment after this.
#[derive(Clone)]
pub struct InferenceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl InferenceConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PropError::MissingConfiguration(
                    "OPENAI_API_KEY is not set; add it to the environment or .env".to_string(),
                )
            })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub fetch_timeout: Duration,
    pub entitlement: PolicyKind,
}

impl AppConfig {
    /// Reads `.env.local` and `.env` (if present), then the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let inference_timeout = env_u64("INFERENCE_TIMEOUT_SECS").unwrap_or(60).max(5);
        let fetch_timeout = env_u64("FETCH_TIMEOUT_SECS").unwrap_or(10).max(1);
        let trial_hours = env_u64("TRIAL_HOURS").unwrap_or(DEFAULT_TRIAL_HOURS);
        let entitlement = match env_string("ENTITLEMENT_POLICY")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("pro_or_trial") | Some("trial") => PolicyKind::ProOrTrial { trial_hours },
            _ => PolicyKind::ProOnly,
        };

        Self {
            inference: InferenceConfig {
                api_key: env_string("OPENAI_API_KEY"),
                base_url: env_string("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: env_string("PROP_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(inference_timeout),
            },
            fetch_timeout: Duration::from_secs(fetch_timeout),
            entitlement,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key).and_then(|v| v.parse::<u64>().ok())
}
