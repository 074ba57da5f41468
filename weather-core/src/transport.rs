//! HTTP transport and the interception pipeline wrapped around it.

use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, Method, StatusCode, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};

use crate::error::{WeatherError, WeatherResult};

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
        }
    }
}

/// A fully read response. The body is buffered so it can be observed and
/// decoded afterwards.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: ApiRequest) -> WeatherResult<ApiResponse>;
}

/// Transport backed by a single `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Build a client with the given timeout and a fixed `Accept: application/json`
    /// default header.
    pub fn new(timeout: Duration) -> WeatherResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> WeatherResult<ApiResponse> {
        let res = self
            .http
            .request(request.method, request.url)
            .send()
            .await?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::ResponseBody {
                status: status.as_u16(),
                source,
            })?;

        Ok(ApiResponse { status, body })
    }
}

/// Side-effecting hook that sees every completed request/response pair.
pub trait ExchangeObserver: Send + Sync + Debug {
    fn observe(&self, request: &ApiRequest, response: &ApiResponse);
}

/// Emits one structured `tracing` record per exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl ExchangeObserver for LoggingObserver {
    fn observe(&self, request: &ApiRequest, response: &ApiResponse) {
        tracing::info!(
            method = %request.method,
            uri = %redact_query(&request.url),
            status = response.status.as_u16(),
            body = %response.body,
            "HTTP exchange"
        );
    }
}

/// Wraps a transport with a single observation point.
///
/// Responses are handed back untouched whatever their status. When the inner
/// transport fails there is nothing to observe and the error propagates as is.
#[derive(Debug)]
pub struct TransportPipeline<T> {
    inner: T,
    observer: Arc<dyn ExchangeObserver>,
}

impl<T: Transport> TransportPipeline<T> {
    pub fn new(inner: T, observer: Arc<dyn ExchangeObserver>) -> Self {
        Self { inner, observer }
    }

    pub fn with_logging(inner: T) -> Self {
        Self::new(inner, Arc::new(LoggingObserver))
    }
}

#[async_trait]
impl<T: Transport> Transport for TransportPipeline<T> {
    async fn send(&self, request: ApiRequest) -> WeatherResult<ApiResponse> {
        let response = self
            .inner
            .send(request.clone())
            .await
            .inspect_err(|err| {
                tracing::warn!(
                    method = %request.method,
                    uri = %redact_query(&request.url),
                    status = ?err.status(),
                    error = %err,
                    "HTTP request failed"
                );
            })?;

        self.observer.observe(&request, &response);

        Ok(response)
    }
}

/// The API key travels in the query string; keep it out of the logs.
fn redact_query(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
