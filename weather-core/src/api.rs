use std::{fmt, sync::Arc, time::Duration};

use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::{
    error::{WeatherError, WeatherResult},
    transport::{ApiRequest, ReqwestTransport, Transport, TransportPipeline},
};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the transport the first time a request is made.
pub type TransportFactory =
    Box<dyn Fn() -> WeatherResult<Arc<dyn Transport>> + Send + Sync + 'static>;

/// JSON GET client against a fixed base address.
///
/// The underlying transport is created lazily and exactly once, even when the
/// first requests race each other; afterwards it is shared by every call.
pub struct ApiClient {
    base_url: Url,
    transport: OnceCell<Arc<dyn Transport>>,
    factory: TransportFactory,
}

impl ApiClient {
    /// Client backed by reqwest with a 30s timeout and exchange logging.
    pub fn new(base_url: &str) -> WeatherResult<Self> {
        Self::with_factory(
            base_url,
            Box::new(|| {
                let transport = ReqwestTransport::new(REQUEST_TIMEOUT)?;
                tracing::debug!("HTTP transport created");
                Ok(Arc::new(TransportPipeline::with_logging(transport)) as Arc<dyn Transport>)
            }),
        )
    }

    pub fn with_factory(base_url: &str, factory: TransportFactory) -> WeatherResult<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            base_url,
            transport: OnceCell::new(),
            factory,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn transport(&self) -> WeatherResult<&Arc<dyn Transport>> {
        self.transport
            .get_or_try_init(|| async { (self.factory)() })
            .await
    }

    /// GET `endpoint` (relative to the base URL) and decode the JSON body.
    ///
    /// Returns `Ok(None)` when the request succeeded but carried no payload
    /// (empty body or a literal `null`).
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> WeatherResult<Option<T>> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|source| WeatherError::InvalidUrl {
                url: endpoint.to_string(),
                source,
            })?;

        let response = self.transport().await?.send(ApiRequest::get(url)).await?;

        if !response.status.is_success() {
            return Err(WeatherError::Transport {
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(None);
        }

        Ok(serde_json::from_str::<Option<T>>(&response.body)?)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("initialized", &self.transport.initialized())
            .finish()
    }
}

/// Relative endpoints only join under the base path when it ends with '/'.
fn parse_base_url(base_url: &str) -> WeatherResult<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };

    Url::parse(&normalized).map_err(|source| WeatherError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })
}
