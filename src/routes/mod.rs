use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::handlers::{self, auth, bookings, categories, location, providers, services, users};
use crate::middleware::auth::{auth_middleware, require_admin, require_customer, require_provider};
use crate::middleware::role_rate_limit::{
    create_role_governor, limit_by_role, RateLimitedRole, RoleDispatchLimiter,
};
use crate::AppState;

/// Largest accepted proof-of-delivery upload
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    // Create role-specific governor layers
    let customer_governor = create_role_governor(RateLimitedRole::Customer);
    let provider_governor = create_role_governor(RateLimitedRole::Provider);

    let authenticated = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(authenticated()),
        );

    let category_routes = Router::new()
        .route("/", get(categories::list_categories))
        .route("/{id}", get(categories::get_category))
        .merge(
            Router::new()
                .route("/", post(categories::create_category))
                .route("/{id}", put(categories::update_category))
                .route("/{id}", delete(categories::delete_category))
                .layer(middleware::from_fn(require_admin))
                .layer(authenticated()),
        );

    let service_routes = Router::new()
        .route("/", get(services::list_services))
        .route("/category/{category_id}", get(services::services_by_category))
        .route("/{id}", get(services::get_service))
        .merge(
            Router::new()
                .route("/", post(services::create_service))
                .route("/{id}", put(services::update_service))
                .route("/{id}", delete(services::delete_service))
                .layer(middleware::from_fn(require_admin))
                .layer(authenticated()),
        );

    let user_routes = Router::new()
        .route("/{id}", get(users::get_user))
        .route("/{id}", put(users::update_user))
        .layer(authenticated())
        .merge(
            Router::new()
                .route("/", get(users::list_users))
                .route("/{id}", delete(users::delete_user))
                .layer(middleware::from_fn(require_admin))
                .layer(authenticated()),
        );

    let provider_routes = Router::new()
        .route("/", get(providers::list_providers))
        .route("/{id}", get(providers::get_provider))
        .merge(
            Router::new()
                .route("/{id}", put(providers::update_provider))
                .layer(authenticated()),
        );

    let location_routes = Router::new()
        .route("/search", get(location::search))
        .route("/reverse", get(location::reverse));

    // Any authenticated role; results are scoped by the caller and each
    // caller is charged against their own role's budget
    let shared_booking_routes = Router::new()
        .route("/", get(bookings::list_bookings))
        .route("/{id}", get(bookings::get_booking))
        .layer(middleware::from_fn_with_state(
            Arc::new(RoleDispatchLimiter::new()),
            limit_by_role,
        ))
        .layer(authenticated());

    // Customer routes
    // Rate limit: 100 requests per minute (1x base)
    let customer_booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .layer(customer_governor)
        .layer(middleware::from_fn(require_customer))
        .layer(authenticated());

    // Provider routes
    // Rate limit: 500 requests per minute (5x base)
    let provider_booking_routes = Router::new()
        .route("/pending", get(bookings::list_pending))
        .route("/{id}/nearby", get(bookings::nearby_bookings))
        .route("/{id}/accept", patch(bookings::accept_booking))
        .route("/{id}/reject", patch(bookings::reject_booking))
        .route("/{id}/status", patch(bookings::update_status))
        .route(
            "/{id}/files",
            post(bookings::upload_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(provider_governor)
        .layer(middleware::from_fn(require_provider))
        .layer(authenticated());

    let booking_routes = shared_booking_routes
        .merge(customer_booking_routes)
        .merge(provider_booking_routes);

    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/services", service_routes)
        .nest("/api/users", user_routes)
        .nest("/api/providers", provider_routes)
        .nest("/api/location", location_routes)
        .nest("/api/bookings", booking_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .with_state(state)
}
