use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;
use crate::entities::provider;
use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::lifecycle::UserSummary;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProviderResponse {
    pub id: i32,
    pub user_id: Uuid,
    pub skills: Option<String>,
    pub availability: bool,
    pub user: Option<UserSummary>,
}

impl ProviderResponse {
    fn new(p: provider::Model, u: Option<user::Model>) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            skills: p.skills,
            availability: p.availability,
            user: u.map(UserSummary::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProviderRequest {
    pub skills: Option<String>,
    pub availability: Option<bool>,
}

pub async fn list_providers(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProviderResponse>>> {
    let providers = provider::Entity::find()
        .order_by_asc(provider::Column::Id)
        .find_also_related(user::Entity)
        .all(&state.db)
        .await?;

    Ok(Json(
        providers
            .into_iter()
            .map(|(p, u)| ProviderResponse::new(p, u))
            .collect(),
    ))
}

pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ProviderResponse>> {
    let (profile, user) = provider::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider not found".to_string()))?;

    Ok(Json(ProviderResponse::new(profile, user)))
}

/// Update skills or availability (admin, or the provider themself)
pub async fn update_provider(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProviderRequest>,
) -> AppResult<Json<ProviderResponse>> {
    let profile = provider::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider not found".to_string()))?;

    if !Actor::from(&claims).is_admin() && claims.sub != profile.user_id {
        return Err(AppError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let user_id = profile.user_id;
    let mut active: provider::ActiveModel = profile.into();

    if let Some(skills) = payload.skills {
        active.skills = Set(Some(skills));
    }

    if let Some(availability) = payload.availability {
        active.availability = Set(availability);
    }

    let updated = active.update(&state.db).await?;
    let user = user::Entity::find_by_id(user_id).one(&state.db).await?;

    Ok(Json(ProviderResponse::new(updated, user)))
}
