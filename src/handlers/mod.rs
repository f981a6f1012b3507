pub mod auth;
pub mod bookings;
pub mod categories;
pub mod location;
pub mod providers;
pub mod services;
pub mod users;

use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
