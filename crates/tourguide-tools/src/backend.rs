//! Tour search backend abstraction

use crate::coerce::{safe_int, safe_str};
use crate::error::Result;
use crate::query::{Dictionary, HotToursQuery, HotelFilter, ResultsQuery, SearchQuery};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Search job state reported when the job is complete
pub const STATE_FINISHED: &str = "finished";

/// Search job state reported for unknown or expired request ids
pub const STATE_NOT_FOUND: &str = "no search results";

/// Progress snapshot of an asynchronous search job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatus {
    pub state: String,
    #[serde(rename = "hotelsfound")]
    pub hotels_found: i64,
    #[serde(rename = "toursfound")]
    pub tours_found: i64,
    /// Percent complete
    pub progress: i64,
    #[serde(rename = "minprice", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<i64>,
    /// Seconds since submission
    #[serde(rename = "timepassed", skip_serializing_if = "Option::is_none")]
    pub time_passed: Option<i64>,
    /// Guidance appended for the model
    #[serde(rename = "_hint", skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl SearchStatus {
    /// Parse the `status` object of a `result.php?type=status` payload
    #[must_use]
    pub fn from_value(status: &Value) -> Self {
        Self {
            state: safe_str(status.get("state")).unwrap_or_default(),
            hotels_found: safe_int(status.get("hotelsfound"), 0),
            tours_found: safe_int(status.get("toursfound"), 0),
            progress: safe_int(status.get("progress"), 0),
            min_price: status
                .get("minprice")
                .filter(|v| !v.is_null())
                .map(|v| safe_int(Some(v), 0)),
            time_passed: status
                .get("timepassed")
                .filter(|v| !v.is_null())
                .map(|v| safe_int(Some(v), 0)),
            hint: None,
        }
    }

    /// Whether the job is complete
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == STATE_FINISHED
    }

    /// Whether the request id is unknown upstream
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.state == STATE_NOT_FOUND
    }

    /// Attach a hint for the model
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Tour search backend.
///
/// Search is asynchronous: submission yields a request id which is then polled
/// and paged through. Results are raw backend JSON; projection happens in the
/// dispatcher.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TourSearchBackend: Send + Sync {
    /// Submit a search; `None` when the backend refused to create the job
    async fn search_tours(&self, query: &SearchQuery) -> Result<Option<String>>;

    /// Current progress of a search job
    async fn search_status(&self, request_id: &str) -> Result<SearchStatus>;

    /// One page of results (`{"status": {...}, "result": {"hotel": [...]}}`)
    async fn search_results(&self, query: &ResultsQuery) -> Result<Value>;

    /// Ask the backend to fetch the next page of a finished search
    async fn continue_search(&self, request_id: &str) -> Result<Value>;

    /// Hot deals feed
    async fn hot_tours(&self, query: &HotToursQuery) -> Result<Vec<Value>>;

    /// Reference data other than hotels
    async fn dictionary(&self, dictionary: &Dictionary) -> Result<Value>;

    /// Hotel catalog
    async fn hotels(&self, filter: &HotelFilter) -> Result<Vec<Value>>;

    /// Re-price a tour
    async fn actualize_tour(&self, tour_id: &str, request_mode: i64, currency: i64) -> Result<Value>;

    /// Flight and price details of a tour
    async fn tour_details(&self, tour_id: &str, currency: i64) -> Result<Value>;

    /// Full hotel record, with reviews when asked
    async fn hotel_info(&self, hotel_code: &str, include_reviews: bool) -> Result<Value>;
}
