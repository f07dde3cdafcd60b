//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use crate::errors::ConsoleError;
use crate::utils::{calc_exp_backoff, CooldownOptions};
use openapi_client::models::ErrorResponse;

/// Bounded retry for transient failures (5xx and transport errors)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub backoff: CooldownOptions,
}

impl RetryPolicy {
    /// Policy for reads
    pub fn queries() -> Self {
        Self {
            max_retries: 3,
            backoff: CooldownOptions::default(),
        }
    }

    /// Policy for state-changing calls
    pub fn mutations() -> Self {
        Self {
            max_retries: 2,
            backoff: CooldownOptions::default(),
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: CooldownOptions::default(),
        }
    }
}

/// HTTP client for backend communication
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    query_retry: RetryPolicy,
    mutation_retry: RetryPolicy,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::ConfigError(format!("HTTP client: {}", e)))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ConsoleError::ConfigError(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::ConfigError(format!(
                "Invalid base URL {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            query_retry: RetryPolicy::queries(),
            mutation_retry: RetryPolicy::mutations(),
        })
    }

    /// Replace the retry policies
    pub fn with_retry_policies(mut self, queries: RetryPolicy, mutations: RetryPolicy) -> Self {
        self.query_retry = queries;
        self.mutation_retry = mutations;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `<base>/<seg>/<seg>/`. Each segment is percent-encoded as a
    /// single path segment; empty segments are skipped.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ConsoleError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ConsoleError::ConfigError("Base URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            for segment in segments.iter().filter(|s| !s.is_empty()) {
                path.push(segment);
            }
            path.push("");
        }
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<T, ConsoleError> {
        self.get_with_query(segments, &[], token).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(String, String)],
        token: Option<&str>,
    ) -> Result<T, ConsoleError> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self
            .execute(&self.query_retry, "GET", || {
                let request = self.client.get(url.clone());
                let request = if query.is_empty() {
                    request
                } else {
                    request.query(query)
                };
                with_bearer(request, token)
            })
            .await?;

        read_json(response).await
    }

    /// Make a GET request returning the raw body
    pub async fn get_bytes(
        &self,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<Vec<u8>, ConsoleError> {
        let url = self.endpoint(segments)?;
        debug!("GET {} (binary)", url);

        let response = self
            .execute(&self.query_retry, "GET", || {
                with_bearer(self.client.get(url.clone()), token)
            })
            .await?;

        Ok(response.bytes().await?.to_vec())
    }

    /// Make a POST request with an optional JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, ConsoleError> {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);

        let response = self
            .execute(&self.mutation_retry, "POST", || {
                let request = self.client.post(url.clone());
                let request = match body {
                    Some(body) => request.json(body),
                    None => request.header(header::CONTENT_TYPE, "application/json"),
                };
                with_bearer(request, token)
            })
            .await?;

        read_json(response).await
    }

    /// Make a POST request without a body
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<T, ConsoleError> {
        self.post::<T, serde_json::Value>(segments, token, None).await
    }

    /// Upload a single file as multipart form field `file`
    pub async fn post_multipart(
        &self,
        segments: &[&str],
        token: Option<&str>,
        file_name: &str,
        contents: &[u8],
    ) -> Result<(), ConsoleError> {
        let url = self.endpoint(segments)?;
        debug!("POST {} (multipart, {} bytes)", url, contents.len());

        self.execute(&self.mutation_retry, "POST", || {
            let part = reqwest::multipart::Part::bytes(contents.to_vec())
                .file_name(file_name.to_string());
            let form = reqwest::multipart::Form::new().part("file", part);
            with_bearer(self.client.post(url.clone()).multipart(form), token)
        })
        .await?;

        Ok(())
    }

    /// Make a DELETE request, ignoring any response body
    pub async fn delete(&self, segments: &[&str], token: Option<&str>) -> Result<(), ConsoleError> {
        let url = self.endpoint(segments)?;
        debug!("DELETE {}", url);

        self.execute(&self.mutation_retry, "DELETE", || {
            with_bearer(self.client.delete(url.clone()), token)
        })
        .await?;

        Ok(())
    }

    /// Send the request built by `build`, retrying transient failures
    /// according to `policy`.
    async fn execute<F>(
        &self,
        policy: &RetryPolicy,
        method: &str,
        build: F,
    ) -> Result<Response, ConsoleError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = match build().send().await {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => Err(api_error(response).await),
                Err(e) => Err(ConsoleError::from(e)),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < policy.max_retries => {
                    let delay = calc_exp_backoff(&policy.backoff, attempt);
                    attempt += 1;
                    warn!(
                        "HTTP {} failed (attempt {}), retrying in {:?}: {}",
                        method, attempt, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!("HTTP {} failed: {}", method, e);
                    return Err(e);
                }
            }
        }
    }
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => request,
    }
}

/// Decode a JSON body. Empty bodies (including 204) decode as `{}`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ConsoleError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn api_error(response: Response) -> ConsoleError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let details = serde_json::from_str::<serde_json::Value>(&body).ok();

    let message = details
        .as_ref()
        .and_then(|v| serde_json::from_value::<ErrorResponse>(v.clone()).ok())
        .and_then(|e| e.best_message().map(str::to_string))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "An error occurred".to_string());

    ConsoleError::Api {
        status: status.as_u16(),
        message,
        details,
    }
}
