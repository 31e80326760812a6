//! Tourguide Tools - travel-search tool catalog and backend
//!
//! This crate provides everything the dispatcher needs below the orchestrator:
//! - Catalog: closed tool enumeration with JSON schemas for the model
//! - Backend: `TourSearchBackend` trait and the TourVisor HTTP client
//! - Queries: typed backend requests built from tool arguments
//! - Dates: departure-window and night-count repair
//! - Polling: bounded wait on asynchronous search jobs
//! - Cards: compact model projections and presentation cards

#![forbid(unsafe_code)]

pub mod backend;
pub mod cards;
pub mod catalog;
pub mod coerce;
pub mod dates;
pub mod error;
pub mod polling;
pub mod query;
pub mod tourvisor;

#[cfg(any(test, feature = "mock"))]
pub use backend::MockTourSearchBackend;
pub use backend::{SearchStatus, TourSearchBackend};
pub use cards::{HotTourSummary, HotelSummary, TourCard};
pub use catalog::{definitions, tool_specs, ToolName};
pub use dates::{normalize_nights, normalize_search_window, DateCorrection, NightsCorrection};
pub use error::{Error, Result};
pub use polling::{poll_until_ready, PollConfig, PollOutcome};
pub use query::{Dictionary, HotToursQuery, HotelFilter, ResultsQuery, SearchQuery};
pub use tourvisor::{TourVisorClient, TourVisorConfig};
