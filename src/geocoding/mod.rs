//! Address lookup used by clients while composing a booking.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

mod nominatim;

pub use nominatim::NominatimClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    pub place_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseResult {
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    pub address: serde_json::Value,
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn search(&self, query: &str) -> AppResult<Vec<Place>>;

    async fn reverse(&self, lat: f64, lng: f64) -> AppResult<ReverseResult>;
}

pub(crate) fn upstream(e: impl std::fmt::Display) -> AppError {
    AppError::Upstream(e.to_string())
}
