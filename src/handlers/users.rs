use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::provider;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub provider: Option<provider::Model>,
}

impl UserResponse {
    fn new(u: user::Model, profile: Option<provider::Model>) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
            provider: profile,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

/// List all users with provider profiles (admin)
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .find_also_related(provider::Entity)
        .all(&state.db)
        .await?;

    Ok(Json(
        users
            .into_iter()
            .map(|(u, p)| UserResponse::new(u, p))
            .collect(),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let (user, profile) = user::Entity::find_by_id(id)
        .find_also_related(provider::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::new(user, profile)))
}

/// Update a user (admin, or the user themself without a role change)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let is_admin = Actor::from(&claims).is_admin();
    if !is_admin && claims.sub != id {
        return Err(AppError::Forbidden(
            "You can only update your own account".to_string(),
        ));
    }
    if payload.role.is_some() && !is_admin {
        return Err(AppError::Forbidden(
            "Only admins can change roles".to_string(),
        ));
    }

    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.clone().into();

    if let Some(name) = payload.name.as_deref().map(str::trim) {
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
        active.name = Set(name.to_string());
    }

    if let Some(email) = payload.email.as_deref().map(str::trim) {
        if email.is_empty() {
            return Err(AppError::Validation("Email cannot be empty".to_string()));
        }
        if email != user.email {
            let taken = user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .one(&state.db)
                .await?;
            if taken.is_some() {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }
        active.email = Set(email.to_string());
    }

    if let Some(role) = payload.role {
        active.role = Set(role);
    }

    let txn = state.db.begin().await?;
    let updated = active.update(&txn).await?;

    let mut profile = provider::Entity::find()
        .filter(provider::Column::UserId.eq(updated.id))
        .one(&txn)
        .await?;

    // A demoted provider can no longer move their jobs
    if user.role == UserRole::Provider && updated.role != UserRole::Provider {
        release_held_bookings(&txn, updated.id).await?;
    }

    // Promoting to provider needs a profile to accept work
    if updated.role == UserRole::Provider && profile.is_none() {
        let created = provider::ActiveModel {
            user_id: Set(updated.id),
            skills: Set(None),
            availability: Set(true),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        profile = Some(created);
    }
    txn.commit().await?;

    Ok(Json(UserResponse::new(updated, profile)))
}

/// Delete a user (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if claims.sub == id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let txn = state.db.begin().await?;

    // Checked for every role: a demoted provider keeps their delivery history
    let history = booking::Entity::find()
        .filter(booking::Column::ProviderId.eq(id))
        .filter(booking::Column::Status.eq(BookingStatus::Completed))
        .count(&txn)
        .await?;
    if history > 0 {
        return Err(AppError::Conflict(
            "User has completed deliveries and cannot be deleted".to_string(),
        ));
    }

    release_held_bookings(&txn, id).await?;
    user::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

/// Hand a user's in-flight jobs back to the pending pool. Completed
/// deliveries keep their provider.
async fn release_held_bookings<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<u64> {
    let released = booking::Entity::update_many()
        .set(booking::ActiveModel {
            provider_id: Set(None),
            status: Set(BookingStatus::Pending),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        })
        .filter(booking::Column::ProviderId.eq(user_id))
        .filter(booking::Column::Status.ne(BookingStatus::Completed))
        .exec(db)
        .await?;

    if released.rows_affected > 0 {
        tracing::warn!(
            user_id = %user_id,
            released = released.rows_affected,
            "Released bookings held by former provider"
        );
    }

    Ok(released.rows_affected)
}
