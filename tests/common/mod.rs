#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::{json, Value};
use uuid::Uuid;

use parcel_delivery_backend::entities::user::{self, UserRole};
use parcel_delivery_backend::entities::{category, provider, service};
use parcel_delivery_backend::geocoding::{AddressLookup, Place, ReverseResult};
use parcel_delivery_backend::lifecycle::{BookingManager, BookingRequest};
use parcel_delivery_backend::utils::jwt::create_token;
use parcel_delivery_backend::{Actor, AppResult, AppState, Config};

pub const JWT_SECRET: &str = "test-secret";

/// Colombo Fort, used as the reference pickup in most scenarios.
pub const ORIGIN: (f64, f64) = (6.9344, 79.8428);

pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opts).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("parcel-delivery-test-{}", Uuid::new_v4()))
}

pub fn test_config(upload_dir: PathBuf) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        upload_dir,
        geocoder_url: "http://geocoder.invalid".to_string(),
        geocoder_user_agent: "parcel-delivery-tests".to_string(),
        nearby_radius_km: 10.0,
    }
}

pub fn manager(db: &DatabaseConnection) -> BookingManager {
    BookingManager::new(db.clone(), 10.0, scratch_dir())
}

pub async fn create_user(db: &DatabaseConnection, name: &str, role: UserRole) -> user::Model {
    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4())),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(role),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .unwrap();

    if role == UserRole::Provider {
        provider::ActiveModel {
            user_id: Set(user.id),
            skills: Set(None),
            availability: Set(true),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    user
}

pub async fn customer(db: &DatabaseConnection, name: &str) -> Actor {
    Actor::Customer(create_user(db, name, UserRole::Customer).await.id)
}

pub async fn provider(db: &DatabaseConnection, name: &str) -> Actor {
    Actor::Provider(create_user(db, name, UserRole::Provider).await.id)
}

pub async fn admin(db: &DatabaseConnection) -> Actor {
    Actor::Admin(create_user(db, "Admin", UserRole::Admin).await.id)
}

/// A category with one service, returning the service id.
pub async fn seed_service(db: &DatabaseConnection) -> i32 {
    let category = category::ActiveModel {
        name: Set("Parcel Delivery".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    service::ActiveModel {
        category_id: Set(category.id),
        name: Set("Standard Parcel Delivery (Colombo)".to_string()),
        price: Set(5.0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub fn request_at(service_id: i32, pickup: (f64, f64), drop: (f64, f64)) -> BookingRequest {
    serde_json::from_value(json!({
        "service_id": service_id,
        "pickup_lat": pickup.0,
        "pickup_lng": pickup.1,
        "pickup_address": "Pickup",
        "drop_lat": drop.0,
        "drop_lng": drop.1,
        "drop_address": "Drop",
    }))
    .unwrap()
}

/// Shift a point north by roughly `km` kilometres.
pub fn north_of(point: (f64, f64), km: f64) -> (f64, f64) {
    (point.0 + km / 111.195, point.1)
}

pub fn token_for(actor: Actor) -> String {
    create_token(
        actor.id(),
        &format!("{}@example.com", actor.id()),
        actor.role(),
        JWT_SECRET,
        1,
    )
    .unwrap()
}

pub fn booking_body(service_id: i32) -> Value {
    json!({
        "service_id": service_id,
        "pickup_lat": "6.9344",
        "pickup_lng": "79.8428",
        "pickup_address": "Colombo Fort",
        "drop_lat": 6.9271,
        "drop_lng": 79.8612,
        "drop_address": "Cinnamon Gardens",
    })
}

/// Canned geocoder; never touches the network.
pub struct StubLookup;

#[async_trait]
impl AddressLookup for StubLookup {
    async fn search(&self, query: &str) -> AppResult<Vec<Place>> {
        Ok(vec![Place {
            display_name: format!("{query}, Sri Lanka"),
            lat: ORIGIN.0,
            lng: ORIGIN.1,
            place_id: 42,
        }])
    }

    async fn reverse(&self, lat: f64, lng: f64) -> AppResult<ReverseResult> {
        Ok(ReverseResult {
            display_name: "Colombo Fort, Colombo".to_string(),
            lat,
            lng,
            address: json!({ "city": "Colombo" }),
        })
    }
}

pub fn app_state(db: &DatabaseConnection) -> AppState {
    AppState {
        db: db.clone(),
        config: test_config(scratch_dir()),
        geocoder: Arc::new(StubLookup),
    }
}
