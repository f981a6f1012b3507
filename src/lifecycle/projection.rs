//! Read-side assembly of booking responses.
//!
//! Related users, services (with category) and attachments are batch-loaded
//! for a set of bookings and joined in memory, so every response shape is
//! built from the same lookup tables.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{category, file, service, user};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceSummary {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub category: Option<CategorySummary>,
}

impl ServiceSummary {
    pub fn new(s: service::Model, c: Option<category::Model>) -> Self {
        Self {
            id: s.id,
            name: s.name,
            price: s.price,
            category: c.map(|c| CategorySummary { id: c.id, name: c.name }),
        }
    }
}

/// Full booking as returned by the booking endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: i32,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_address: String,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub drop_address: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer: Option<UserSummary>,
    pub provider: Option<UserSummary>,
    pub service: Option<ServiceSummary>,
    pub files: Vec<file::Model>,
    #[serde(rename = "nearbyBookings", skip_serializing_if = "Option::is_none")]
    pub nearby_bookings: Option<Vec<NearbyBooking>>,
}

/// Route-consolidation candidate.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyBooking {
    pub id: Uuid,
    pub customer: Option<UserSummary>,
    pub service: Option<ServiceSummary>,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_address: String,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub drop_address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    #[serde(rename = "currentBooking")]
    pub current_booking: NearbyBooking,
    #[serde(rename = "nearbyBookings")]
    pub nearby_bookings: Vec<NearbyBooking>,
}

#[derive(Debug, Default)]
pub struct RelatedRecords {
    users: HashMap<Uuid, UserSummary>,
    services: HashMap<i32, ServiceSummary>,
    files: HashMap<Uuid, Vec<file::Model>>,
}

impl RelatedRecords {
    pub async fn load<C: ConnectionTrait>(db: &C, bookings: &[booking::Model]) -> AppResult<Self> {
        if bookings.is_empty() {
            return Ok(Self::default());
        }

        let user_ids: HashSet<Uuid> = bookings
            .iter()
            .flat_map(|b| std::iter::once(b.customer_id).chain(b.provider_id))
            .collect();
        let service_ids: HashSet<i32> = bookings.iter().map(|b| b.service_id).collect();
        let booking_ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();

        let users = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();

        let services = service::Entity::find()
            .filter(service::Column::Id.is_in(service_ids))
            .find_also_related(category::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(s, c)| (s.id, ServiceSummary::new(s, c)))
            .collect();

        let mut files: HashMap<Uuid, Vec<file::Model>> = HashMap::new();
        for f in file::Entity::find()
            .filter(file::Column::BookingId.is_in(booking_ids))
            .order_by_asc(file::Column::CreatedAt)
            .all(db)
            .await?
        {
            files.entry(f.booking_id).or_default().push(f);
        }

        Ok(Self {
            users,
            services,
            files,
        })
    }

    pub fn user_summary(&self, id: Uuid) -> Option<UserSummary> {
        self.users.get(&id).cloned()
    }

    pub fn service_with_category(&self, id: i32) -> Option<ServiceSummary> {
        self.services.get(&id).cloned()
    }

    pub fn view(&self, b: &booking::Model) -> BookingView {
        BookingView {
            id: b.id,
            customer_id: b.customer_id,
            provider_id: b.provider_id,
            service_id: b.service_id,
            pickup_lat: b.pickup_lat,
            pickup_lng: b.pickup_lng,
            pickup_address: b.pickup_address.clone(),
            drop_lat: b.drop_lat,
            drop_lng: b.drop_lng,
            drop_address: b.drop_address.clone(),
            status: b.status,
            created_at: b.created_at.with_timezone(&Utc),
            updated_at: b.updated_at.with_timezone(&Utc),
            customer: self.user_summary(b.customer_id),
            provider: b.provider_id.and_then(|id| self.user_summary(id)),
            service: self.service_with_category(b.service_id),
            files: self.files.get(&b.id).cloned().unwrap_or_default(),
            nearby_bookings: None,
        }
    }

    pub fn nearby(&self, b: &booking::Model) -> NearbyBooking {
        NearbyBooking {
            id: b.id,
            customer: self.user_summary(b.customer_id),
            service: self.service_with_category(b.service_id),
            pickup_lat: b.pickup_lat,
            pickup_lng: b.pickup_lng,
            pickup_address: b.pickup_address.clone(),
            drop_lat: b.drop_lat,
            drop_lng: b.drop_lng,
            drop_address: b.drop_address.clone(),
            created_at: b.created_at.with_timezone(&Utc),
        }
    }
}
