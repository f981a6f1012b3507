//! Startup seeding: the admin account and the default delivery catalogue.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::entities::{category, service};
use crate::error::{AppError, AppResult};

pub const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin123";

const CATALOGUE: &[(&str, &[(&str, f64)])] = &[
    (
        "Parcel Delivery",
        &[
            ("Standard Parcel Delivery (Colombo)", 5.0),
            ("Standard Parcel Delivery (Other Cities)", 8.0),
            ("Parcel Delivery (Up to 5kg)", 10.0),
            ("Parcel Delivery (5-10kg)", 15.0),
            ("Parcel Delivery (10-20kg)", 25.0),
        ],
    ),
    (
        "Food Delivery",
        &[
            ("Food Delivery (Colombo)", 3.0),
            ("Food Delivery (Suburbs)", 5.0),
            ("Food Delivery (Express - 30 min)", 8.0),
        ],
    ),
    (
        "Document Delivery",
        &[
            ("Document Delivery (Same Day)", 6.0),
            ("Document Delivery (Express)", 10.0),
            ("Legal Document Delivery", 15.0),
        ],
    ),
    (
        "Grocery Delivery",
        &[
            ("Grocery Delivery (Small - Up to 10kg)", 4.0),
            ("Grocery Delivery (Medium - 10-20kg)", 7.0),
            ("Grocery Delivery (Large - 20kg+)", 12.0),
        ],
    ),
    (
        "Express Delivery",
        &[
            ("Express Delivery (2 hours)", 20.0),
            ("Express Delivery (1 hour)", 30.0),
            ("Express Delivery (30 minutes)", 50.0),
        ],
    ),
    (
        "Furniture & Heavy Items",
        &[
            ("Furniture Delivery (Small)", 25.0),
            ("Furniture Delivery (Medium)", 40.0),
            ("Furniture Delivery (Large)", 60.0),
            ("Heavy Items Delivery (20-50kg)", 35.0),
        ],
    ),
];

pub async fn run(db: &DatabaseConnection) -> AppResult<()> {
    seed_admin(db).await?;
    seed_catalogue(db).await
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Seed the admin account if it doesn't exist
async fn seed_admin(db: &DatabaseConnection) -> AppResult<()> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(ADMIN_EMAIL))
        .one(db)
        .await?;

    if existing.is_none() {
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Admin".to_string()),
            email: Set(ADMIN_EMAIL.to_string()),
            password_hash: Set(hash_password(ADMIN_PASSWORD)?),
            role: Set(UserRole::Admin),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(db)
        .await?;
        tracing::info!("Admin account created: {}", ADMIN_EMAIL);
    }

    Ok(())
}

/// Populate categories and services on an empty catalogue
async fn seed_catalogue(db: &DatabaseConnection) -> AppResult<()> {
    if category::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    for (category_name, services) in CATALOGUE {
        let created = category::ActiveModel {
            name: Set(category_name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for (service_name, price) in services.iter() {
            service::ActiveModel {
                category_id: Set(created.id),
                name: Set(service_name.to_string()),
                price: Set(*price),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    tracing::info!(categories = CATALOGUE.len(), "Default catalogue seeded");
    Ok(())
}
