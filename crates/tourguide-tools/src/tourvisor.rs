//! TourVisor XML/JSON gateway client

use crate::backend::{SearchStatus, TourSearchBackend};
use crate::coerce::{as_list, safe_str};
use crate::error::{Error, Result};
use crate::query::{Dictionary, HotToursQuery, HotelFilter, ResultsQuery, SearchQuery};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default gateway URL
pub const DEFAULT_BASE_URL: &str = "https://tourvisor.ru/xml";

/// Gateway configuration
#[derive(Clone)]
pub struct TourVisorConfig {
    /// Agent login
    pub login: String,
    /// Agent password
    pub password: String,
    /// Base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: password never reaches logs
impl fmt::Debug for TourVisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourVisorConfig")
            .field("login", &self.login)
            .field("password", &"****")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Defaults with empty credentials
impl Default for TourVisorConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl TourVisorConfig {
    /// Create a configuration for the given credentials
    #[must_use]
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create configuration from `TOURVISOR_LOGIN` and `TOURVISOR_PASSWORD`
    pub fn from_env() -> Result<Self> {
        let login = std::env::var("TOURVISOR_LOGIN")
            .map_err(|_| Error::InvalidInput("TOURVISOR_LOGIN not set".to_string()))?;
        let password = std::env::var("TOURVISOR_PASSWORD")
            .map_err(|_| Error::InvalidInput("TOURVISOR_PASSWORD not set".to_string()))?;
        Ok(Self::new(login, password))
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Which upstream id an endpoint error refers to
#[derive(Debug, Clone, Copy)]
enum Subject<'a> {
    Search(&'a str),
    Tour(&'a str),
    Other,
}

/// HTTP client for the TourVisor gateway
pub struct TourVisorClient {
    client: Client,
    config: TourVisorConfig,
}

impl TourVisorClient {
    /// Create a new client
    pub fn new(config: TourVisorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(TourVisorConfig::from_env()?)
    }

    async fn get(&self, endpoint: &str, params: &[(String, String)], subject: Subject<'_>) -> Result<Value> {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        debug!(endpoint, params = params.len(), "TourVisor request");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("authlogin", self.config.login.as_str()),
                ("authpass", self.config.password.as_str()),
                ("format", "json"),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    Error::from(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "TourVisor returned an error status");
            return Err(classify_failure(&body, subject));
        }

        let value: Value = serde_json::from_str(&body)?;
        if let Some(message) = upstream_error(&value) {
            warn!(endpoint, error = %message, "TourVisor reported an error");
            return Err(classify_failure(&message, subject));
        }
        Ok(value)
    }
}

/// Error text embedded in an otherwise successful payload
fn upstream_error(value: &Value) -> Option<String> {
    ["/error", "/data/error", "/result/error"]
        .iter()
        .find_map(|pointer| safe_str(value.pointer(pointer)))
}

fn classify_failure(message: &str, subject: Subject<'_>) -> Error {
    let lower = message.to_lowercase();
    let gone = lower.contains("not found") || lower.contains("expired") || lower.contains("не найден");
    match subject {
        Subject::Search(id) if gone => Error::SearchNotFound(id.to_string()),
        Subject::Tour(id) if gone || lower.contains("actual") => Error::TourIdExpired(id.to_string()),
        _ => Error::Api(message.chars().take(300).collect()),
    }
}

/// `data` wrapper used by the result and hotel endpoints, or the payload itself
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or_default(),
        other => other,
    }
}

fn params(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}

#[async_trait]
impl TourSearchBackend for TourVisorClient {
    #[instrument(skip(self, query), fields(country = ?query.country))]
    async fn search_tours(&self, query: &SearchQuery) -> Result<Option<String>> {
        match self.get("search.php", &query.to_params(), Subject::Other).await {
            Ok(value) => Ok(safe_str(value.pointer("/result/requestid"))),
            // Past dates and similar refusals come back as an error body, not a request id
            Err(Error::Api(message)) => {
                warn!(error = %message, "Search was not created");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn search_status(&self, request_id: &str) -> Result<SearchStatus> {
        let value = self
            .get(
                "result.php",
                &params(&[("requestid", request_id.to_string()), ("type", "status".to_string())]),
                Subject::Search(request_id),
            )
            .await?;
        let data = unwrap_data(value);
        Ok(SearchStatus::from_value(data.get("status").unwrap_or(&data)))
    }

    async fn search_results(&self, query: &ResultsQuery) -> Result<Value> {
        let mut pairs = vec![
            ("requestid", query.request_id.clone()),
            ("type", "result".to_string()),
            ("page", query.page.to_string()),
            ("onpage", query.per_page.to_string()),
        ];
        if query.operator_status {
            pairs.push(("operatorstatus", "1".to_string()));
        }
        if query.no_description {
            pairs.push(("nodescription", "1".to_string()));
        }
        let value = self
            .get("result.php", &params(&pairs), Subject::Search(&query.request_id))
            .await?;
        Ok(unwrap_data(value))
    }

    async fn continue_search(&self, request_id: &str) -> Result<Value> {
        let value = self
            .get(
                "search.php",
                &params(&[("continue", request_id.to_string())]),
                Subject::Search(request_id),
            )
            .await?;
        Ok(value.get("result").cloned().unwrap_or(value))
    }

    async fn hot_tours(&self, query: &HotToursQuery) -> Result<Vec<Value>> {
        let value = self.get("hottours.php", &query.to_params(), Subject::Other).await?;
        let feed = value.get("hottours").unwrap_or(&Value::Null);
        let tours = match feed.get("tour") {
            Some(inner) => as_list(Some(inner)),
            None => as_list(Some(feed)),
        };
        Ok(tours)
    }

    async fn dictionary(&self, dictionary: &Dictionary) -> Result<Value> {
        let mut pairs = vec![("type".to_string(), dictionary.list_type().to_string())];
        pairs.extend(dictionary.to_params());
        let value = self.get("list.php", &pairs, Subject::Other).await?;
        Ok(value.get("lists").cloned().unwrap_or(value))
    }

    async fn hotels(&self, filter: &HotelFilter) -> Result<Vec<Value>> {
        let mut pairs = vec![("type".to_string(), "hotel".to_string())];
        pairs.extend(filter.to_params());
        let value = self.get("list.php", &pairs, Subject::Other).await?;
        Ok(as_list(value.pointer("/lists/hotels/hotel")))
    }

    async fn actualize_tour(&self, tour_id: &str, request_mode: i64, currency: i64) -> Result<Value> {
        let value = self
            .get(
                "actualize.php",
                &params(&[
                    ("tourid", tour_id.to_string()),
                    ("request", request_mode.to_string()),
                    ("currency", currency.to_string()),
                ]),
                Subject::Tour(tour_id),
            )
            .await?;
        Ok(unwrap_data(value))
    }

    async fn tour_details(&self, tour_id: &str, currency: i64) -> Result<Value> {
        self.get(
            "actdetail.php",
            &params(&[("tourid", tour_id.to_string()), ("currency", currency.to_string())]),
            Subject::Tour(tour_id),
        )
        .await
    }

    async fn hotel_info(&self, hotel_code: &str, include_reviews: bool) -> Result<Value> {
        let mut pairs = vec![
            ("hotelcode", hotel_code.to_string()),
            ("imgbig", "1".to_string()),
            ("removetags", "1".to_string()),
        ];
        if include_reviews {
            pairs.push(("reviews", "1".to_string()));
        }
        let value = self.get("hotel.php", &params(&pairs), Subject::Other).await?;
        let data = unwrap_data(value);
        Ok(data.get("hotel").cloned().unwrap_or(data))
    }
}
