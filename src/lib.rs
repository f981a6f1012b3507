pub mod actor;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod geocoding;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod routes;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use actor::Actor;
pub use config::Config;
pub use error::{AppError, AppResult};

use geocoding::AddressLookup;
use lifecycle::BookingManager;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub geocoder: Arc<dyn AddressLookup>,
}

impl AppState {
    pub fn bookings(&self) -> BookingManager {
        BookingManager::new(
            self.db.clone(),
            self.config.nearby_radius_km,
            self.config.upload_dir.clone(),
        )
    }
}
