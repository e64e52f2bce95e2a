use crate::config::ApiConfig;
use crate::metrics_defs::{REQUEST_ATTEMPT, REQUEST_DURATION, REQUEST_FAILURE};
use crate::types::{Outage, SiteInfo, SiteOutage};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{counter, histogram};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const API_KEY_HEADER: &str = "x-api-key";

/// Failure of a single request attempt. These are the failures that get retried.
#[derive(thiserror::Error, Debug)]
pub enum AttemptError {
    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SiteApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("API key is not a valid header value")]
    InvalidApiKey,
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{endpoint} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        source: AttemptError,
    },
    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

/// The operations the site API offers. The endpoint decides both the HTTP
/// method and the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Outages,
    SiteInfo(&'a str),
    SiteOutages(&'a str),
}

impl<'a> Endpoint<'a> {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Outages | Endpoint::SiteInfo(_) => Method::GET,
            Endpoint::SiteOutages(_) => Method::POST,
        }
    }

    fn segments(&self) -> Vec<&'a str> {
        match *self {
            Endpoint::Outages => vec!["outages"],
            Endpoint::SiteInfo(site_id) => vec!["site-info", site_id],
            Endpoint::SiteOutages(site_id) => vec!["site-outages", site_id],
        }
    }

    /// Low cardinality name used as a metrics label.
    fn name(&self) -> &'static str {
        match self {
            Endpoint::Outages => "outages",
            Endpoint::SiteInfo(_) => "site-info",
            Endpoint::SiteOutages(_) => "site-outages",
        }
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.segments().join("/"))
    }
}

#[async_trait]
pub trait SiteApi: Send + Sync {
    /// All outages known to the service. Empty if the service sends no body.
    async fn list_outages(&self) -> Result<Vec<Outage>, SiteApiError>;

    /// Site details including its devices. The default record if the service
    /// sends no body.
    async fn fetch_site_info(&self, site_id: &str) -> Result<SiteInfo, SiteApiError>;

    /// Submits the processed outages for a site and hands back whatever the
    /// service answered with.
    async fn submit_site_outages(
        &self,
        site_id: &str,
        outages: &[SiteOutage],
    ) -> Result<Option<Value>, SiteApiError>;
}

/// HTTP client for the site API. Every request carries the API key and is
/// retried on network errors and non-2xx responses.
#[derive(Clone)]
pub struct SiteApiClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: HeaderValue,
    max_attempts: u32,
    retry_delay: Duration,
}

impl SiteApiClient {
    pub fn new(config: &ApiConfig, api_key: &str) -> Result<Self, SiteApiError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| SiteApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(SiteApiError::InvalidUrl(config.base_url.clone()));
        }

        let mut api_key = HeaderValue::from_str(api_key).map_err(|_| SiteApiError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(SiteApiError::Client)?;

        Ok(SiteApiClient {
            client,
            base_url,
            api_key,
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay(),
        })
    }

    fn url(&self, endpoint: Endpoint<'_>) -> Result<Url, SiteApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SiteApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }

    /// Sends a request to `endpoint`, retrying failed attempts up to the
    /// configured maximum. `Ok(None)` means the service answered with an
    /// empty body.
    pub async fn request<B, T>(
        &self,
        endpoint: Endpoint<'_>,
        body: Option<&B>,
    ) -> Result<Option<T>, SiteApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint)?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(attempt, method = %endpoint.method(), %url, "Sending request");
            counter!(REQUEST_ATTEMPT, "endpoint" => endpoint.name()).increment(1);

            let started = Instant::now();
            let result = self.send_once(endpoint.method(), url.clone(), body).await;
            histogram!(REQUEST_DURATION, "endpoint" => endpoint.name())
                .record(started.elapsed().as_secs_f64());

            let err = match result {
                Ok(bytes) => return decode(endpoint, &bytes),
                Err(err) => err,
            };

            counter!(REQUEST_FAILURE, "endpoint" => endpoint.name()).increment(1);
            tracing::error!(attempt, %endpoint, error = %err, "Request failed");

            if attempt >= self.max_attempts {
                tracing::error!(attempts = attempt, %endpoint, "All request attempts failed");
                return Err(SiteApiError::RetriesExhausted {
                    endpoint: endpoint.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }

            if !self.retry_delay.is_zero() {
                sleep(self.retry_delay).await;
            }
        }
    }

    async fn send_once<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Vec<u8>, AttemptError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut request = self
            .client
            .request(method, url)
            .header(API_KEY_HEADER, self.api_key.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%status, headers = ?response.headers(), "Received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status { status, body });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

fn decode<T: DeserializeOwned>(
    endpoint: Endpoint<'_>,
    bytes: &[u8],
) -> Result<Option<T>, SiteApiError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|source| SiteApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}

#[async_trait]
impl SiteApi for SiteApiClient {
    async fn list_outages(&self) -> Result<Vec<Outage>, SiteApiError> {
        let outages = self.request::<(), _>(Endpoint::Outages, None).await?;
        Ok(outages.unwrap_or_default())
    }

    async fn fetch_site_info(&self, site_id: &str) -> Result<SiteInfo, SiteApiError> {
        let site = self
            .request::<(), _>(Endpoint::SiteInfo(site_id), None)
            .await?;
        Ok(site.unwrap_or_default())
    }

    async fn submit_site_outages(
        &self,
        site_id: &str,
        outages: &[SiteOutage],
    ) -> Result<Option<Value>, SiteApiError> {
        self.request(Endpoint::SiteOutages(site_id), Some(outages))
            .await
    }
}
