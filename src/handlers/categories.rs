use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{booking, category, service};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub services: Vec<service::Model>,
}

fn required_name(payload: &CategoryRequest) -> AppResult<String> {
    payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Name is required".to_string()))
}

/// List all categories with their services
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategoryResponse>>> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .find_with_related(service::Entity)
        .all(&state.db)
        .await?;

    let responses = categories
        .into_iter()
        .map(|(c, services)| CategoryResponse {
            id: c.id,
            name: c.name,
            services,
        })
        .collect();

    Ok(Json(responses))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CategoryResponse>> {
    let (category, services) = category::Entity::find_by_id(id)
        .find_with_related(service::Entity)
        .all(&state.db)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(CategoryResponse {
        id: category.id,
        name: category.name,
        services,
    }))
}

/// Create a category (admin)
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<category::Model>)> {
    let name = required_name(&payload)?;

    let result = category::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// Rename a category (admin)
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Json<category::Model>> {
    let category = category::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let mut active: category::ActiveModel = category.into();
    if payload.name.is_some() {
        active.name = Set(required_name(&payload)?);
    }

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete a category and its services (admin)
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let booked = booking::Entity::find()
        .inner_join(service::Entity)
        .filter(service::Column::CategoryId.eq(id))
        .count(&state.db)
        .await?;
    if booked > 0 {
        return Err(AppError::Conflict(
            "Category has services with bookings and cannot be deleted".to_string(),
        ));
    }

    let result = category::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Category deleted" })))
}
