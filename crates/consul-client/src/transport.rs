//! HTTP transport
//!
//! [`Transport`] is the single seam between the typed clients and the
//! network. [`HttpTransport`] is the reqwest-backed implementation; tests
//! substitute their own.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use consul_api::constants::{header, param};
use reqwest::header::HeaderMap;
use reqwest::{Certificate, Client, Method};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::{ConsulClientConfig, TokenPlacement};
use crate::error::{ConsulError, Result};

/// A request relative to the agent's base URL
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    /// Endpoint path such as `/v1/kv`
    pub path: String,
    /// Further path segments, each percent-encoded on its own
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// Blocking wait the server may hold the request for
    pub wait: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            segments: Vec::new(),
            query: Vec::new(),
            body: None,
            wait: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one path segment; `/` inside it is escaped
    pub fn segment(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append a KV key, keeping its `/` separators as path structure
    pub fn key(mut self, key: &str) -> Self {
        self.segments.extend(key.split('/').map(|s| s.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    /// Boolean switch parameter such as `recurse` or `passing`
    pub fn flag(self, name: &str, enabled: bool) -> Self {
        if enabled { self.query(name, "true") } else { self }
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self.body(bytes))
    }

    /// Path as sent, before encoding
    pub fn display_path(&self) -> String {
        let mut path = self.path.clone();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.display_path())
    }
}

/// A 2xx response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(v) = value.parse() {
            self.headers.insert(name, v);
        }
        self
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes requests against a Consul agent
#[async_trait]
pub trait Transport: Send + Sync {
    /// Non-2xx statuses surface as [`ConsulError::Api`]
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: Option<String>,
    token_placement: TokenPlacement,
    datacenter: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ConsulClientConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.base_url())
            .map_err(|e| ConsulError::InvalidConfig(format!("invalid agent address: {}", e)))?;

        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if config.use_tls {
            if config.trust_all {
                builder = builder.danger_accept_invalid_certs(true);
            }
            if let Some(pem) = &config.ca_pem {
                let cert = Certificate::from_pem(pem).map_err(|e| {
                    ConsulError::InvalidConfig(format!("invalid CA certificate: {}", e))
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }
        let client = builder
            .build()
            .map_err(|e| ConsulError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: config.acl_token.clone().filter(|t| !t.is_empty()),
            token_placement: config.token_placement,
            datacenter: config.datacenter.clone(),
            timeout: config.timeout,
        })
    }

    /// Client-side deadline: the base timeout plus the blocking wait and the
    /// jitter Consul may add to it (up to wait/16)
    pub fn request_timeout(&self, wait: Option<Duration>) -> Duration {
        match wait {
            Some(w) => self.timeout + w + w / 16,
            None => self.timeout,
        }
    }

    pub fn build_url(&self, request: &HttpRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ConsulError::InvalidConfig("agent address cannot be a base".into()))?;
            segments.pop_if_empty();
            for part in request.path.trim_start_matches('/').split('/') {
                segments.push(part);
            }
            for segment in &request.segments {
                segments.push(segment);
            }
        }

        let mut query = request.query.clone();
        if let Some(dc) = &self.datacenter
            && !request.has_query(param::DC)
        {
            query.push((param::DC.to_string(), dc.clone()));
        }
        if let Some(token) = &self.token
            && self.token_placement == TokenPlacement::QueryParam
        {
            query.push((param::TOKEN.to_string(), token.clone()));
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        let url = self.build_url(&request)?;
        let timeout = self.request_timeout(request.wait);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .timeout(timeout);
        if let Some(token) = &self.token
            && self.token_placement == TokenPlacement::Header
        {
            builder = builder.header(header::TOKEN, token);
        }
        if let Some(body) = request.body.take() {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| map_error(e, timeout))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| map_error(e, timeout))?;
        debug!("{} -> {}", request, status);

        if !status.is_success() {
            return Err(ConsulError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim().to_string(),
                index: header_index(&headers),
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

// The URL may carry the ACL token, so it is stripped from the message
fn map_error(e: reqwest::Error, timeout: Duration) -> ConsulError {
    if e.is_timeout() {
        ConsulError::Timeout(timeout)
    } else {
        ConsulError::Transport(e.without_url().to_string())
    }
}

fn header_index(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::INDEX)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
