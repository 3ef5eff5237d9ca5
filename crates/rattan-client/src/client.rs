use std::sync::Arc;

use rattan_core::{ChatCompletionRequest, ChatCompletionResponse};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::options::{with_body, RequestOption};
use crate::transport::{ApiCall, Dispatcher, HttpDispatcher, ResourceType};

/// Service client. Cheap to clone and safe to share across tasks.
///
/// Interactive calls go through a transport with a request timeout.
/// Batch calls go through a separate transport that caps concurrent
/// connections and carries no deadline by default.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    dispatcher: Arc<dyn Dispatcher>,
    batch_dispatcher: Arc<dyn Dispatcher>,
}

impl Client {
    /// Create a client for the default endpoint with the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new().with_api_key(api_key))
    }

    /// Create a client from an explicit configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let dispatcher = HttpDispatcher::standard(&config)?;
        let batch_dispatcher = HttpDispatcher::batch(&config, config.batch_max_parallel)?;
        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            batch_dispatcher: Arc::new(batch_dispatcher),
        })
    }

    /// Create a client from RATTAN_API_KEY and RATTAN_BASE_URL
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a client with explicit dispatchers. Tests use this to
    /// substitute doubles for the HTTP transports.
    pub fn with_dispatchers(
        config: ClientConfig,
        dispatcher: Arc<dyn Dispatcher>,
        batch_dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            batch_dispatcher,
        }
    }

    /// Get the config
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve an endpoint suffix against the configured base URL
    pub fn full_url(&self, suffix: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), suffix)
    }

    pub(crate) fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub(crate) fn batch_dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.batch_dispatcher
    }

    /// Shared non-streaming POST path. Serializes the request, appends
    /// it as the body option after any caller options, and dispatches.
    pub(crate) async fn post_completion(
        &self,
        dispatcher: &Arc<dyn Dispatcher>,
        suffix: &str,
        resource: ResourceType,
        request: &ChatCompletionRequest,
        mut options: Vec<RequestOption>,
    ) -> Result<ChatCompletionResponse> {
        let body = serde_json::to_value(request)?;
        options.push(with_body(body));

        let call = ApiCall::post(self.full_url(suffix), resource, request.model(), options);
        let value = dispatcher.dispatch(call).await?;
        let response = serde_json::from_value(value)?;
        Ok(response)
    }
}
