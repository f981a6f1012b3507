use async_trait::async_trait;
use serde::Deserialize;

use super::{upstream, AddressLookup, Place, ReverseResult};
use crate::error::AppResult;
use crate::utils::geo::parse_coordinate;

const SEARCH_LIMIT: &str = "10";

/// OpenStreetMap Nominatim client.
#[derive(Clone, Debug)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    lat: String,
    lon: String,
    place_id: u64,
}

#[derive(Debug, Deserialize)]
struct ReverseHit {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: serde_json::Value,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(upstream)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AddressLookup for NominatimClient {
    async fn search(&self, query: &str) -> AppResult<Vec<Place>> {
        let hits: Vec<SearchHit> = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", SEARCH_LIMIT)])
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        tracing::debug!(query, results = hits.len(), "Address search");

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                Some(Place {
                    lat: parse_coordinate(&hit.lat)?,
                    lng: parse_coordinate(&hit.lon)?,
                    display_name: hit.display_name,
                    place_id: hit.place_id,
                })
            })
            .collect())
    }

    async fn reverse(&self, lat: f64, lng: f64) -> AppResult<ReverseResult> {
        let hit: ReverseHit = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(ReverseResult {
            display_name: hit.display_name,
            lat,
            lng,
            address: hit.address,
        })
    }
}
