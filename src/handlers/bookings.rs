use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::actor::Actor;
use crate::entities::booking::BookingStatus;
use crate::entities::file;
use crate::error::{AppError, AppResult};
use crate::lifecycle::transitions::FORWARD_STATUSES;
use crate::lifecycle::{BookingRequest, BookingView, RouteView, Upload};
use crate::utils::jwt::Claims;
use crate::AppState;

/// Bookings scoped to the caller's role
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingView>>> {
    let bookings = state.bookings().list_for_actor(Actor::from(&claims)).await?;
    Ok(Json(bookings))
}

/// Unassigned pending bookings (provider)
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingView>>> {
    let bookings = state.bookings().list_pending(Actor::from(&claims)).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingView>> {
    let booking = state
        .bookings()
        .get_by_id(Actor::from(&claims), booking_id)
        .await?;
    Ok(Json(booking))
}

/// Pending bookings near this booking's pickup point (provider)
pub async fn nearby_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<RouteView>> {
    let route = state
        .bookings()
        .nearby_for_route(Actor::from(&claims), booking_id)
        .await?;
    Ok(Json(route))
}

/// Create a booking (customer)
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BookingRequest>,
) -> AppResult<(StatusCode, Json<BookingView>)> {
    let booking = state
        .bookings()
        .create(Actor::from(&claims), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn accept_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingView>> {
    let booking = state
        .bookings()
        .accept(Actor::from(&claims), booking_id)
        .await?;
    Ok(Json(booking))
}

pub async fn reject_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    state
        .bookings()
        .reject(Actor::from(&claims), booking_id)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Booking rejected" })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<BookingView>> {
    let requested = payload
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<BookingStatus>().ok())
        .filter(|status| FORWARD_STATUSES.contains(status))
        .ok_or_else(|| AppError::Validation("Invalid status".to_string()))?;

    let booking = state
        .bookings()
        .advance_status(Actor::from(&claims), booking_id, requested)
        .await?;
    Ok(Json(booking))
}

/// Attach a proof-of-delivery file (provider holding the booking)
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<file::Model>)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;

        if !bytes.is_empty() {
            upload = Some(Upload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        }
        break;
    }

    let record = state
        .bookings()
        .attach_file(Actor::from(&claims), booking_id, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
