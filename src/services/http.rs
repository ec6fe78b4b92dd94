use crate::constants::{limits, network, retry};
use crate::endpoints::{AuthScheme, EndpointsSpec};
use crate::errors::ToolError;
use crate::services::config;
use crate::services::logger::Logger;
use base64::Engine;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Process-wide cache for an exchanged bearer token. Owned and injected so
/// tests get a fresh cache per scenario. Once populated it is reused for the
/// rest of the process lifetime; there is no expiry check, which is a known
/// gap for long-lived processes.
#[derive(Clone, Default)]
pub struct TokenCache {
    inner: Arc<Mutex<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    acquired_at: Instant,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        let guard = self.inner.lock().ok()?;
        guard.as_ref().map(|entry| entry.token.clone())
    }

    /// Last writer wins; concurrent exchanges may race, which is acceptable
    /// because the exchange is idempotent.
    pub fn store(&self, token: &str) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(CachedToken {
                token: token.to_string(),
                acquired_at: Instant::now(),
            });
        }
    }

    pub fn age_ms(&self) -> Option<u128> {
        let guard = self.inner.lock().ok()?;
        guard
            .as_ref()
            .map(|entry| entry.acquired_at.elapsed().as_millis())
    }
}

#[derive(Debug, Clone)]
pub struct RequestInit {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
}

impl RequestInit {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: HashMap::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

pub struct HttpService {
    logger: Logger,
    spec: Arc<EndpointsSpec>,
    client: Client,
    token_cache: TokenCache,
}

impl HttpService {
    pub fn new(
        logger: Logger,
        spec: Arc<EndpointsSpec>,
        token_cache: TokenCache,
    ) -> Result<Self, ToolError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            logger,
            spec,
            client,
            token_cache,
        })
    }

    pub fn spec(&self) -> &EndpointsSpec {
        &self.spec
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.token_cache
    }

    /// Environment override wins over the configured default; both are
    /// stripped of trailing slashes.
    pub fn resolve_base_url(&self) -> String {
        if let Some(base) = config::base_url_override() {
            return base;
        }
        self.spec.base_url.trim_end_matches('/').to_string()
    }

    /// One request against the API: base resolution, content negotiation,
    /// credential injection, structured errors. `path` may also be an
    /// absolute URL (link-style pagination hands those back verbatim).
    pub async fn request(&self, path: &str, init: RequestInit) -> Result<Value, ToolError> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.resolve_base_url(), path)
        };

        let mut headers: HashMap<String, String> = HashMap::new();
        headers.insert(
            "Accept".to_string(),
            "application/json, text/plain, */*".to_string(),
        );
        headers.insert("User-Agent".to_string(), "opsbridge/0.1.0".to_string());
        for (key, value) in init.headers.iter() {
            headers.insert(key.clone(), value.clone());
        }
        if init.body.is_some()
            && !headers
                .keys()
                .any(|key| key.eq_ignore_ascii_case("content-type"))
        {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        for (key, value) in self.auth_headers().await {
            headers.insert(key, value);
        }

        self.logger.debug(
            "http request",
            Some(&serde_json::json!({"url": url, "method": init.method.as_str()})),
        );

        let mut request = self.client.request(init.method.clone(), &url);
        for (key, value) in headers.iter() {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = init.body.as_ref() {
            let rendered = serde_json::to_string(body)
                .map_err(|err| ToolError::internal(format!("Failed to encode body: {}", err)))?;
            request = request.body(rendered);
        }
        request = request.timeout(Duration::from_millis(network::TIMEOUT_API_REQUEST_MS));

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = response.text().await.map_err(map_reqwest_error)?;
        let snippet: String = text.chars().take(limits::BODY_SNIPPET_CHARS).collect();

        if !status.is_success() {
            self.logger.warn(
                "http error",
                Some(&serde_json::json!({"status": status.as_u16(), "url": url})),
            );
            return Err(ToolError::http_error(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                &snippet,
            ));
        }

        if content_type.contains("application/json") {
            if text.trim().is_empty() {
                return Ok(serde_json::json!({}));
            }
            return serde_json::from_str(&text)
                .map_err(|_| ToolError::response_parse(status.as_u16(), &snippet));
        }
        Ok(Value::String(text))
    }

    /// GET with bounded exponential backoff. Only the fixed transient status
    /// set is retried; anything else propagates immediately, and exhausting
    /// the attempts re-raises the last error unchanged.
    pub async fn get_with_retry(&self, path: &str) -> Result<Value, ToolError> {
        let mut attempt = 0usize;
        let mut delay = retry::BASE_DELAY_MS;
        loop {
            match self.request(path, RequestInit::get()).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    let transient = err
                        .http_status()
                        .map(|status| retry::STATUS_CODES.contains(&status))
                        .unwrap_or(false);
                    if !transient || attempt >= retry::MAX_ATTEMPTS {
                        return Err(err);
                    }
                    self.logger.warn(
                        "http retry",
                        Some(&serde_json::json!({
                            "attempt": attempt,
                            "status": err.http_status(),
                        })),
                    );
                    let jitter = (rand::random::<f64>() * retry::JITTER_MS as f64) as u64;
                    tokio::time::sleep(Duration::from_millis(delay + jitter)).await;
                    delay *= 2;
                }
            }
        }
    }

    async fn auth_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        match self.spec.auth.scheme {
            AuthScheme::Bearer | AuthScheme::OAuth2 => {
                if let Some(token) = self.resolve_bearer_token().await {
                    headers.insert("Authorization".to_string(), format!("Bearer {}", token));
                }
            }
            AuthScheme::ApiKey => {
                if let (Some(header), Some(key)) =
                    (self.spec.auth.header.as_deref(), config::api_key())
                {
                    headers.insert(header.to_string(), key);
                }
            }
            AuthScheme::Basic => {
                if let Some((user, pass)) = config::basic_credentials() {
                    let encoded = base64::engine::general_purpose::STANDARD
                        .encode(format!("{}:{}", user, pass));
                    headers.insert("Authorization".to_string(), format!("Basic {}", encoded));
                }
            }
        }
        headers
    }

    /// Resolution order: explicit configured token, then the cached exchanged
    /// token, then one fresh client-credentials exchange. Returns `None` when
    /// no source yields a token; callers proceed unauthenticated and get an
    /// ordinary 401/403 from the API.
    pub async fn resolve_bearer_token(&self) -> Option<String> {
        if let Some((token, _source)) = config::static_token() {
            return Some(token);
        }
        if let Some(token) = self.token_cache.get() {
            return Some(token);
        }
        self.exchange_client_credentials().await
    }

    async fn exchange_client_credentials(&self) -> Option<String> {
        let (client_id, client_secret) = config::client_credentials()?;
        let token_url = format!("{}/oauth2/token", self.resolve_base_url());
        let form = [
            ("grant_type", "client_credentials".to_string()),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        let body = match serde_urlencoded::to_string(form) {
            Ok(body) => body,
            Err(err) => {
                self.logger.warn(
                    "token exchange encoding failed",
                    Some(&serde_json::json!({"error": err.to_string()})),
                );
                return None;
            }
        };

        let response = self
            .client
            .post(&token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .timeout(Duration::from_millis(network::TIMEOUT_TOKEN_EXCHANGE_MS))
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                self.logger.warn(
                    "token exchange failed",
                    Some(&serde_json::json!({"error": err.to_string()})),
                );
                return None;
            }
        };
        let status = response.status();
        if !status.is_success() {
            self.logger.warn(
                "token exchange rejected",
                Some(&serde_json::json!({"status": status.as_u16()})),
            );
            return None;
        }
        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(_) => {
                self.logger.warn("token exchange response unparsable", None);
                return None;
            }
        };
        let token = payload
            .get("access_token")
            .and_then(|value| value.as_str())
            .unwrap_or("");
        if token.is_empty() {
            self.logger
                .warn("token exchange response missing access_token", None);
            return None;
        }
        self.token_cache.store(token);
        Some(token.to_string())
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        return ToolError::timeout("HTTP request timed out");
    }
    ToolError::retryable(err.to_string())
}
