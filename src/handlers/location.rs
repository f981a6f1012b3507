use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::geocoding::{Place, ReverseResult};
use crate::utils::geo::parse_coordinate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

/// Free-text address search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Place>>> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter 'q' is required".to_string()))?;

    let places = state.geocoder.search(query).await?;
    Ok(Json(places))
}

/// Address for a coordinate pair
pub async fn reverse(
    State(state): State<AppState>,
    Query(params): Query<ReverseQuery>,
) -> AppResult<Json<ReverseResult>> {
    let coordinate = |raw: Option<&str>| raw.and_then(parse_coordinate);

    let (Some(lat), Some(lng)) = (
        coordinate(params.lat.as_deref()),
        coordinate(params.lng.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "Valid 'lat' and 'lng' query parameters are required".to_string(),
        ));
    };

    let place = state.geocoder.reverse(lat, lng).await?;
    Ok(Json(place))
}
