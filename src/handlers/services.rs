use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use crate::entities::{booking, category, service};
use crate::error::{AppError, AppResult};
use crate::lifecycle::ServiceSummary;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub category_id: Option<i32>,
    pub name: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub category_id: Option<i32>,
    pub name: Option<String>,
    pub price: Option<f64>,
}

fn check_price(price: f64) -> AppResult<f64> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(AppError::Validation("Price must be greater than zero".to_string()))
    }
}

async fn ensure_category(state: &AppState, category_id: i32) -> AppResult<()> {
    category::Entity::find_by_id(category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid category".to_string()))?;
    Ok(())
}

/// List all services with their category
pub async fn list_services(State(state): State<AppState>) -> AppResult<Json<Vec<ServiceSummary>>> {
    let services = service::Entity::find()
        .order_by_asc(service::Column::Id)
        .find_also_related(category::Entity)
        .all(&state.db)
        .await?;

    Ok(Json(
        services
            .into_iter()
            .map(|(s, c)| ServiceSummary::new(s, c))
            .collect(),
    ))
}

pub async fn services_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> AppResult<Json<Vec<ServiceSummary>>> {
    let services = service::Entity::find()
        .filter(service::Column::CategoryId.eq(category_id))
        .order_by_asc(service::Column::Id)
        .find_also_related(category::Entity)
        .all(&state.db)
        .await?;

    Ok(Json(
        services
            .into_iter()
            .map(|(s, c)| ServiceSummary::new(s, c))
            .collect(),
    ))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ServiceSummary>> {
    let (service, category) = service::Entity::find_by_id(id)
        .find_also_related(category::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    Ok(Json(ServiceSummary::new(service, category)))
}

/// Create a service (admin)
pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<service::Model>)> {
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    let (Some(category_id), Some(price)) = (payload.category_id, payload.price) else {
        return Err(AppError::Validation(
            "Category, name and price are required".to_string(),
        ));
    };
    if name.is_empty() {
        return Err(AppError::Validation(
            "Category, name and price are required".to_string(),
        ));
    }
    let price = check_price(price)?;
    ensure_category(&state, category_id).await?;

    let result = service::ActiveModel {
        category_id: Set(category_id),
        name: Set(name.to_string()),
        price: Set(price),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// Update a service (admin)
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateServiceRequest>,
) -> AppResult<Json<service::Model>> {
    let service = service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    let mut active: service::ActiveModel = service.into();

    if let Some(category_id) = payload.category_id {
        ensure_category(&state, category_id).await?;
        active.category_id = Set(category_id);
    }

    if let Some(name) = payload.name.as_deref().map(str::trim) {
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
        active.name = Set(name.to_string());
    }

    if let Some(price) = payload.price {
        active.price = Set(check_price(price)?);
    }

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete a service (admin)
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let booked = booking::Entity::find()
        .filter(booking::Column::ServiceId.eq(id))
        .count(&state.db)
        .await?;
    if booked > 0 {
        return Err(AppError::Conflict(
            "Service has bookings and cannot be deleted".to_string(),
        ));
    }

    let result = service::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Service not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Service deleted" })))
}
