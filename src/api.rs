/// Envelope transport for the Bitkub REST API.
///
/// Every JSON endpoint answers with the same envelope:
///
/// ```text
/// {"error": <int>, "result": <any>, "pagination": {...}}
/// ```
///
/// [`BitkubApi`] issues the request (signing it when needed), decodes the
/// envelope, and turns a non-zero `error` into an [`ApiError`] before the
/// `result` is ever looked at. Transport errors are returned as-is; nothing
/// here retries.
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{ClientConfig, API_KEY_HEADER};
use crate::credentials::Credentials;
use crate::errors::{ApiError, BitkubError};
use crate::pagination::PageInfo;
use crate::signing::EnvelopeBuilder;

/// Use as the payload argument of a signed call that sends no fields.
pub const NO_PAYLOAD: Option<&'static ()> = None;

/// Query-string parameters, encoded in key order.
///
/// Values are stored in their `Display` form, so strings pass through
/// unchanged and types with a custom text form use it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Per-call options threaded explicitly through every request.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Credentials used for this call only, shadowing the client-level ones.
    pub credentials: Option<Credentials>,
    /// Aborts the in-flight request when cancelled.
    pub cancel: Option<CancellationToken>,
    /// Deadline for the whole request, response body included.
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A decoded envelope: the typed `result` plus the raw pagination block.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub result: T,
    pub pagination: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    error: i64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    pagination: Value,
}

/// Low-level REST client for the Bitkub exchange.
#[derive(Debug, Clone)]
pub struct BitkubApi {
    client: Client,
    base_url: Url,
    user_agent: String,
    credentials: Option<Credentials>,
}

impl BitkubApi {
    /// Create an API client from `config`.
    pub fn new(config: ClientConfig) -> Result<Self, BitkubError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = match config.http_client {
            Some(client) => client,
            None => Client::builder().timeout(config.timeout).build()?,
        };
        debug!(
            "api.new base_url={} user_agent={} has_credentials={}",
            base_url,
            config.user_agent,
            config.credentials.is_some()
        );
        Ok(Self {
            client,
            base_url,
            user_agent: config.user_agent,
            credentials: config.credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Pick the call-scoped override, falling back to the client-level value.
    pub(crate) fn resolve_credentials<'a>(
        &'a self,
        opts: &'a CallOptions,
    ) -> Result<&'a Credentials, BitkubError> {
        opts.credentials
            .as_ref()
            .or(self.credentials.as_ref())
            .ok_or(BitkubError::Unauthenticated)
    }

    fn endpoint_url(&self, endpoint: &str, query: Option<&QueryParams>) -> Result<Url, BitkubError> {
        let mut url = self.base_url.join(endpoint)?;
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.iter() {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.user_agent.as_str());
        match body {
            Some(body) => builder.header(CONTENT_TYPE, "application/json").body(body),
            None => builder,
        }
    }

    /// Send the request, honouring the call's deadline and cancellation token.
    async fn dispatch(
        &self,
        builder: RequestBuilder,
        opts: &CallOptions,
    ) -> Result<(StatusCode, String), BitkubError> {
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, BitkubError>((status, text))
        };
        let bounded = async {
            match opts.timeout {
                Some(limit) => match tokio::time::timeout(limit, exchange).await {
                    Ok(result) => result,
                    Err(_) => Err(BitkubError::Timeout),
                },
                None => exchange.await,
            }
        };
        match &opts.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(BitkubError::Cancelled),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }

    // -----------------------------------------------------------------------
    // Unsigned
    // -----------------------------------------------------------------------

    /// GET an endpoint whose body is not wrapped in the envelope.
    pub async fn fetch_raw<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&QueryParams>,
        opts: &CallOptions,
    ) -> Result<T, BitkubError> {
        let url = self.endpoint_url(endpoint, query)?;
        debug!("api.fetch_raw url={}", url);
        let (status, text) = self.dispatch(self.request(Method::GET, url, None), opts).await?;
        if !status.is_success() {
            return Err(http_status(status, &text));
        }
        serde_json::from_str(&text).map_err(|e| BitkubError::decode(endpoint, e))
    }

    /// GET an enveloped public endpoint and return its `result`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&QueryParams>,
        opts: &CallOptions,
    ) -> Result<T, BitkubError> {
        Ok(self.fetch_envelope(endpoint, query, opts).await?.result)
    }

    /// GET an enveloped public endpoint and return the decoded envelope.
    pub async fn fetch_envelope<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&QueryParams>,
        opts: &CallOptions,
    ) -> Result<Response<T>, BitkubError> {
        let url = self.endpoint_url(endpoint, query)?;
        debug!("api.fetch url={}", url);
        let (status, text) = self.dispatch(self.request(Method::GET, url, None), opts).await?;
        decode_envelope(endpoint, status, &text)
    }

    // -----------------------------------------------------------------------
    // Signed
    // -----------------------------------------------------------------------

    /// POST a signed request and return its `result`.
    ///
    /// Pass [`NO_PAYLOAD`] for endpoints that take no fields.
    pub async fn fetch_secure<P, T>(
        &self,
        endpoint: &str,
        payload: Option<&P>,
        opts: &CallOptions,
    ) -> Result<T, BitkubError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Ok(self.fetch_secure_envelope(endpoint, payload, opts).await?.result)
    }

    /// POST a signed request and return the decoded envelope.
    pub async fn fetch_secure_envelope<P, T>(
        &self,
        endpoint: &str,
        payload: Option<&P>,
        opts: &CallOptions,
    ) -> Result<Response<T>, BitkubError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let credentials = self.resolve_credentials(opts)?;
        let envelope = EnvelopeBuilder::new(payload)?;
        self.send_signed(endpoint, None, envelope, credentials, opts)
            .await
    }

    pub(crate) async fn send_signed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&QueryParams>,
        envelope: EnvelopeBuilder,
        credentials: &Credentials,
        opts: &CallOptions,
    ) -> Result<Response<T>, BitkubError> {
        let url = self.endpoint_url(endpoint, query)?;
        let body = envelope.sign(credentials)?;
        debug!("api.fetch_secure url={} body_len={}", url, body.len());
        let builder = self
            .request(Method::POST, url, Some(body))
            .header(API_KEY_HEADER, credentials.key());
        let (status, text) = self.dispatch(builder, opts).await?;
        decode_envelope(endpoint, status, &text)
    }
}

fn http_status(status: StatusCode, text: &str) -> BitkubError {
    BitkubError::HttpStatus {
        status: status.as_u16(),
        body: text.chars().take(500).collect(),
    }
}

/// Decode an envelope, checking `error` before touching `result`.
fn decode_envelope<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    text: &str,
) -> Result<Response<T>, BitkubError> {
    let envelope: RawEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(http_status(status, text)),
        Err(e) => {
            debug!(
                "api.decode_envelope decode_failed endpoint={} error={}",
                endpoint, e
            );
            return Err(BitkubError::decode(endpoint, e));
        }
    };
    if envelope.error != 0 {
        debug!(
            "api.decode_envelope api_error endpoint={} code={}",
            endpoint, envelope.error
        );
        return Err(ApiError::new(envelope.error).into());
    }
    if !status.is_success() {
        return Err(http_status(status, text));
    }
    let result = serde_json::from_value(envelope.result)
        .map_err(|e| BitkubError::decode(endpoint, e))?;
    let pagination = serde_json::from_value::<Option<PageInfo>>(envelope.pagination)
        .map_err(|e| BitkubError::decode(endpoint, format!("pagination: {e}")))?;
    Ok(Response { result, pagination })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> StatusCode {
        StatusCode::OK
    }

    #[test]
    fn query_params_sort_and_stringify() {
        let params = QueryParams::new().with("sym", "THB_BTC").with("lmt", 10).with("a", 1.5);
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1.5"), ("lmt", "10"), ("sym", "THB_BTC")]);
        assert_eq!(params.get("lmt"), Some("10"));
    }

    #[test]
    fn endpoint_url_appends_query() {
        let api = BitkubApi::new(ClientConfig::new()).unwrap();
        let url = api
            .endpoint_url("/api/market/trades", Some(&QueryParams::new().with("sym", "THB_BTC")))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.bitkub.com/api/market/trades?sym=THB_BTC");
        let url = api.endpoint_url("/api/status", Some(&QueryParams::new())).unwrap();
        assert_eq!(url.as_str(), "https://api.bitkub.com/api/status");
    }

    #[test]
    fn non_zero_error_short_circuits_result() {
        // The result would decode fine as a Vec, but the error wins.
        let err = decode_envelope::<Vec<i64>>("/x", ok(), r#"{"error":18,"result":[1,2]}"#)
            .unwrap_err();
        assert_eq!(err.error_code(), Some(18));
        assert_eq!(err.to_string(), "Insufficient balance");
    }

    #[test]
    fn non_zero_error_ignores_malformed_pagination() {
        let err = decode_envelope::<Value>("/x", ok(), r#"{"error":18,"result":null,"pagination":[]}"#)
            .unwrap_err();
        assert_eq!(err.error_code(), Some(18));

        let err = decode_envelope::<Value>("/x", ok(), r#"{"error":7,"pagination":{"page":"x"}}"#)
            .unwrap_err();
        assert_eq!(err.error_code(), Some(7));
    }

    #[test]
    fn malformed_pagination_on_success_names_endpoint() {
        let err = decode_envelope::<Vec<i64>>(
            "/api/fiat/deposit-history",
            ok(),
            r#"{"error":0,"result":[],"pagination":[]}"#,
        )
        .unwrap_err();
        match err {
            BitkubError::Decode { context, message } => {
                assert_eq!(context, "/api/fiat/deposit-history");
                assert!(message.starts_with("pagination"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_error_field_means_success() {
        let resp = decode_envelope::<i64>("/x", ok(), r#"{"result":5}"#).unwrap();
        assert_eq!(resp.result, 5);
        assert!(resp.pagination.is_none());
    }

    #[test]
    fn result_type_mismatch_names_endpoint() {
        let err = decode_envelope::<Vec<i64>>("/api/user/limits", ok(), r#"{"error":0,"result":"x"}"#)
            .unwrap_err();
        match err {
            BitkubError::Decode { context, .. } => assert_eq!(context, "/api/user/limits"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pagination_block_is_returned_raw() {
        let resp = decode_envelope::<Vec<i64>>(
            "/x",
            ok(),
            r#"{"error":0,"result":[],"pagination":{"page":"2","last":5}}"#,
        )
        .unwrap();
        let page = resp.pagination.unwrap();
        assert_eq!((page.page, page.last), (2, 5));
    }

    #[test]
    fn non_envelope_error_status() {
        let err = decode_envelope::<i64>("/x", StatusCode::BAD_GATEWAY, "<html>bad</html>").unwrap_err();
        assert!(matches!(err, BitkubError::HttpStatus { status: 502, .. }));
    }

    #[test]
    fn envelope_error_wins_over_status() {
        let err = decode_envelope::<i64>("/x", StatusCode::BAD_REQUEST, r#"{"error":3}"#).unwrap_err();
        assert_eq!(err.error_code(), Some(3));
    }

    #[test]
    fn call_credentials_shadow_client_credentials() {
        let api = BitkubApi::new(
            ClientConfig::new().with_credentials(Credentials::new("client", "s1")),
        )
        .unwrap();
        let plain = CallOptions::new();
        assert_eq!(api.resolve_credentials(&plain).unwrap().key(), "client");

        let scoped = CallOptions::new().with_credentials(Credentials::new("scoped", "s2"));
        assert_eq!(api.resolve_credentials(&scoped).unwrap().key(), "scoped");
        assert_eq!(api.resolve_credentials(&plain).unwrap().key(), "client");
    }

    #[test]
    fn no_credentials_is_unauthenticated() {
        let api = BitkubApi::new(ClientConfig::new()).unwrap();
        let err = api.resolve_credentials(&CallOptions::new()).unwrap_err();
        assert!(matches!(err, BitkubError::Unauthenticated));
    }
}
