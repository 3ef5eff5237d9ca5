use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default service endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.rattan.dev/v1";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "RATTAN_API_KEY";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "RATTAN_BASE_URL";

/// Authentication configuration enum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// API Key authentication, sent as a bearer token
    ApiKey {
        /// The API key
        key: String,
    },
    /// No authentication
    None,
}

impl AuthConfig {
    /// Create API key auth from environment variable
    pub fn from_env(env_var: &str) -> Option<Self> {
        std::env::var(env_var).ok().map(|key| Self::ApiKey { key })
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::None
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Authentication configuration
    #[serde(flatten)]
    pub auth: AuthConfig,
    /// Request timeout for interactive calls, in seconds
    #[serde(with = "serde_duration", default = "default_timeout")]
    pub timeout: Duration,
    /// Request timeout for batch calls, in seconds. Batch requests may be
    /// held server-side for a long time, so there is no deadline unless
    /// one is set here.
    #[serde(with = "serde_duration::option", default)]
    pub batch_timeout: Option<Duration>,
    /// Maximum concurrent in-flight batch requests. A value of 0 leaves
    /// the batch transport uncapped.
    #[serde(default = "default_batch_max_parallel")]
    pub batch_max_parallel: usize,
    /// Maximum automatic retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Additional headers to include
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ClientConfig {
    /// Create a config for the default service endpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from RATTAN_API_KEY and RATTAN_BASE_URL
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        match AuthConfig::from_env(API_KEY_ENV) {
            Some(auth) => config.auth = auth,
            None => {
                return Err(ClientError::Config(format!("{} is not set", API_KEY_ENV)));
            }
        }
        Ok(config)
    }

    /// Set base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.auth = AuthConfig::ApiKey { key: key.into() };
        self
    }

    /// Set timeout for interactive calls
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a deadline for batch calls
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }

    /// Set the batch connection cap, 0 to disable
    pub fn with_batch_max_parallel(mut self, max_parallel: usize) -> Self {
        self.batch_max_parallel = max_parallel;
        self
    }

    /// Set the maximum retry count for transient failures
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set multiple headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: AuthConfig::None,
            timeout: Duration::from_secs(60),
            batch_timeout: None,
            batch_max_parallel: default_batch_max_parallel(),
            max_retries: default_max_retries(),
            headers: HashMap::new(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_batch_max_parallel() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

// Custom serialization for Duration
mod serde_duration {
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

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(duration) => serializer.serialize_some(&duration.as_secs()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let secs = Option::<u64>::deserialize(deserializer)?;
            Ok(secs.map(Duration::from_secs))
        }
    }
}
