//! Authenticated HTTP transport for the Komga REST API.

use crate::config::KomgaConfig;
use crate::error::{ComicError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "X-API-Key";

/// Query string parameters, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    pub fn push_opt<T: ToString>(self, key: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

/// Komga API client.
pub struct KomgaClient {
    client: reqwest::Client,
    config: KomgaConfig,
}

impl KomgaClient {
    /// Create a client with the configured per-request timeout.
    pub fn new(config: KomgaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &KomgaConfig {
        &self.config
    }

    /// Headers for the configured auth mode. The API key wins over basic credentials.
    pub fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ComicError::Config(format!("Invalid API key: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
            return Ok(headers);
        }

        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                let token = STANDARD.encode(format!("{}:{}", username, password));
                let value = HeaderValue::from_str(&format!("Basic {}", token))
                    .map_err(|e| ComicError::Config(format!("Invalid credentials: {}", e)))?;
                headers.insert(AUTHORIZATION, value);
                Ok(headers)
            }
            _ => Err(ComicError::Config(
                "Komga authentication not configured: set KOMGA_API_KEY or \
                 KOMGA_USERNAME/KOMGA_PASSWORD, or call configure_komga"
                    .to_string(),
            )),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub async fn get(&self, path: &str, query: &QueryParams) -> Result<Value> {
        self.send(Method::GET, path, query, None::<&Value>).await
    }

    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        query: &QueryParams,
        body: &B,
    ) -> Result<Value> {
        self.send(Method::POST, path, query, Some(body)).await
    }

    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(Method::PATCH, path, &QueryParams::new(), Some(body)).await
    }

    /// Send one request. Fails before touching the network when auth is missing.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &QueryParams,
        body: Option<&B>,
    ) -> Result<Value> {
        let headers = self.auth_headers()?;
        let url = self.url(path);
        debug!("{} {} {:?}", method, url, query.pairs());

        let mut request = self.client.request(method, &url).headers(headers);
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ComicError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
