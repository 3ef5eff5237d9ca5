use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::{header, Client, Method, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::config::{AuthConfig, ClientConfig};
use crate::error::{ClientError, Result};
use crate::options::{RequestOption, RequestOptions};

/// Resource classification attached to each call for logging and
/// instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// Model endpoint resources, chat and batch chat
    Endpoint,
    /// Bot resources
    Bot,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Endpoint => "endpoint",
            Self::Bot => "bot",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing API call
pub struct ApiCall {
    /// HTTP method
    pub method: Method,
    /// Fully resolved request URL
    pub url: String,
    /// Resource classification
    pub resource: ResourceType,
    /// Model the call targets
    pub model: String,
    /// Request options, applied in order at dispatch time
    pub options: Vec<RequestOption>,
}

impl ApiCall {
    /// Convenience constructor for the POST endpoints
    pub fn post(
        url: impl Into<String>,
        resource: ResourceType,
        model: impl Into<String>,
        options: Vec<RequestOption>,
    ) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            resource,
            model: model.into(),
            options,
        }
    }
}

/// Server-sent event payloads, one `data:` field per item
pub type SseStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Performs a single request-response exchange with the service.
///
/// The client resolves URLs and assembles [`ApiCall`]s, then hands them
/// to its dispatcher. Tests substitute a recording double here.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Execute the call, returning the decoded JSON response body
    async fn dispatch(&self, call: ApiCall) -> Result<Value>;

    /// Execute the call, returning the stream of SSE data payloads
    async fn dispatch_stream(&self, call: ApiCall) -> Result<SseStream>;
}

/// HTTP dispatcher backed by a retrying reqwest client
pub struct HttpDispatcher {
    http: ClientWithMiddleware,
    auth: AuthConfig,
    headers: HashMap<String, String>,
    permits: Option<Arc<Semaphore>>,
}

impl HttpDispatcher {
    /// Build the transport for interactive calls, with the configured
    /// request timeout
    pub fn standard(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            http: wrap_with_retry(client, config.max_retries),
            auth: config.auth.clone(),
            headers: config.headers.clone(),
            permits: None,
        })
    }

    /// Build the transport for batch calls.
    ///
    /// `max_parallel` caps concurrent in-flight requests, 0 leaves the
    /// transport uncapped. Batch requests may be held server-side for a
    /// long time, so no deadline is applied unless the config sets one.
    pub fn batch(config: &ClientConfig, max_parallel: usize) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.batch_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let permits = if max_parallel > 0 {
            Some(Arc::new(Semaphore::new(max_parallel)))
        } else {
            None
        };

        Ok(Self {
            http: wrap_with_retry(client, config.max_retries),
            auth: config.auth.clone(),
            headers: config.headers.clone(),
            permits,
        })
    }

    /// Remaining connection permits, None when the transport is uncapped
    pub fn available_permits(&self) -> Option<usize> {
        self.permits
            .as_ref()
            .map(|permits| permits.available_permits())
    }

    /// Build request headers
    fn build_headers(&self, options: &RequestOptions) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Add authentication header
        if let AuthConfig::ApiKey { key } = &self.auth {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| ClientError::Config(format!("Invalid auth header value: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        // Add custom headers from config
        for (key, value) in &self.headers {
            insert_header(&mut headers, key, value)?;
        }

        // Per-request headers win over config headers
        for (key, value) in options.headers() {
            insert_header(&mut headers, key, value)?;
        }

        Ok(headers)
    }

    /// Apply options, acquire a connection permit and send the request.
    /// Returns the successful response together with the held permit.
    async fn send(
        &self,
        call: ApiCall,
    ) -> Result<(reqwest::Response, Option<tokio::sync::OwnedSemaphorePermit>)> {
        let options = RequestOptions::assemble(call.options);
        let headers = self.build_headers(&options)?;

        let permit = match &self.permits {
            Some(permits) => Some(
                permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| ClientError::Network(e.to_string()))?,
            ),
            None => None,
        };

        log::debug!(
            "{} {} resource={} model={}",
            call.method,
            call.url,
            call.resource,
            call.model
        );

        let mut request = self.http.request(call.method, &call.url).headers(headers);
        if let Some(body) = options.body() {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("request failed with status {}", status);
            return Err(status_error(status, error_text));
        }

        Ok((response, permit))
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, call: ApiCall) -> Result<Value> {
        let (response, _permit) = self.send(call).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let value = serde_json::from_str(&body)?;
        Ok(value)
    }

    async fn dispatch_stream(&self, call: ApiCall) -> Result<SseStream> {
        let (response, permit) = self.send(call).await?;

        let stream = response.bytes_stream().eventsource().map(move |event| {
            // Keep the connection permit until the stream is dropped
            let _permit = &permit;
            match event {
                Ok(event) => Ok(event.data),
                Err(e) => Err(ClientError::Stream(e.to_string())),
            }
        });

        Ok(Box::pin(stream))
    }
}

/// Convert and insert one header, rejecting invalid names or values
fn insert_header(headers: &mut header::HeaderMap, key: &str, value: &str) -> Result<()> {
    let header_name = header::HeaderName::from_bytes(key.as_bytes())
        .map_err(|e| ClientError::Config(format!("Invalid header name: {}", e)))?;
    let header_value = header::HeaderValue::from_str(value)
        .map_err(|e| ClientError::Config(format!("Invalid header value: {}", e)))?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// Wrap a client with retry middleware using exponential backoff
fn wrap_with_retry(client: Client, max_retries: u32) -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder()
        .base(2)
        .build_with_max_retries(max_retries);

    reqwest_middleware::ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

/// Map a non-success status and error body to the matching error
fn status_error(status: StatusCode, body: String) -> ClientError {
    match status.as_u16() {
        401 | 403 => ClientError::Auth(body),
        429 => ClientError::RateLimited(body),
        status => ClientError::Api {
            status,
            message: body,
        },
    }
}
