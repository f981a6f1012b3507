use std::path::PathBuf;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::actor::Actor;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::file::{self, FileKind};
use crate::entities::service;
use crate::error::{AppError, AppResult};
use crate::lifecycle::projection::{BookingView, NearbyBooking, RelatedRecords, RouteView};
use crate::lifecycle::request::BookingRequest;
use crate::lifecycle::transitions::{check_advance, is_active};
use crate::utils::geo::{find_nearby, RouteEndpoints};

/// File payload taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct BookingManager {
    db: DatabaseConnection,
    radius_km: f64,
    upload_dir: PathBuf,
}

impl BookingManager {
    pub fn new(db: DatabaseConnection, radius_km: f64, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            radius_km,
            upload_dir: upload_dir.into(),
        }
    }

    /// Create a pending, unassigned booking on behalf of a customer.
    pub async fn create(&self, actor: Actor, request: BookingRequest) -> AppResult<BookingView> {
        let Actor::Customer(customer_id) = actor else {
            return Err(AppError::Forbidden("Customer access required".to_string()));
        };

        let new = request.validate()?;

        service::Entity::find_by_id(new.service_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Unknown service_id {}", new.service_id)))?;

        let now = Utc::now().fixed_offset();
        let created = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            provider_id: Set(None),
            service_id: Set(new.service_id),
            pickup_lat: Set(new.pickup.lat),
            pickup_lng: Set(new.pickup.lng),
            pickup_address: Set(new.pickup_address),
            drop_lat: Set(new.drop.lat),
            drop_lng: Set(new.drop.lng),
            drop_address: Set(new.drop_address),
            status: Set(BookingStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(booking_id = %created.id, customer_id = %customer_id, "Booking created");

        self.present(&created).await
    }

    /// Bookings visible to the actor, newest first.
    pub async fn list_for_actor(&self, actor: Actor) -> AppResult<Vec<BookingView>> {
        let query = match actor {
            Actor::Customer(id) => {
                booking::Entity::find().filter(booking::Column::CustomerId.eq(id))
            }
            Actor::Provider(id) => {
                booking::Entity::find().filter(booking::Column::ProviderId.eq(id))
            }
            Actor::Admin(_) => booking::Entity::find(),
        };

        let bookings = query
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await?;

        self.present_all(&bookings).await
    }

    /// The unassigned pool providers browse for work.
    pub async fn list_pending(&self, actor: Actor) -> AppResult<Vec<BookingView>> {
        require_provider(actor)?;

        let bookings = self.pending_pool(None).await?;
        self.present_all(&bookings).await
    }

    /// Claim a pending booking. The precondition and the assignment are a
    /// single conditional update, so concurrent claims have one winner.
    ///
    /// The returned view always carries `nearbyBookings` (possibly empty).
    pub async fn accept(&self, actor: Actor, booking_id: Uuid) -> AppResult<BookingView> {
        let provider_id = require_provider(actor)?;
        if !self.find(booking_id).await?.is_claimable() {
            return Err(AppError::NotAvailable);
        }

        let result = booking::Entity::update_many()
            .set(booking::ActiveModel {
                provider_id: Set(Some(provider_id)),
                status: Set(BookingStatus::Accepted),
                updated_at: Set(Utc::now().fixed_offset()),
                ..Default::default()
            })
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::Status.eq(BookingStatus::Pending))
            .filter(booking::Column::ProviderId.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(booking_id = %booking_id, provider_id = %provider_id, "Claim lost, booking not available");
            return Err(AppError::NotAvailable);
        }

        tracing::info!(booking_id = %booking_id, provider_id = %provider_id, "Booking accepted");

        let accepted = self.find(booking_id).await?;
        let mut view = self.present(&accepted).await?;
        view.nearby_bookings = Some(self.try_nearby(&accepted).await.unwrap_or_default());

        Ok(view)
    }

    /// Release a held booking back to the pending pool, from any status.
    pub async fn reject(&self, actor: Actor, booking_id: Uuid) -> AppResult<()> {
        let provider_id = require_provider(actor)?;
        let current = self.find(booking_id).await?;

        if !current.is_held_by(provider_id) {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        let result = booking::Entity::update_many()
            .set(booking::ActiveModel {
                provider_id: Set(None),
                status: Set(BookingStatus::Pending),
                updated_at: Set(Utc::now().fixed_offset()),
                ..Default::default()
            })
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::ProviderId.eq(provider_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        if current.status != BookingStatus::Accepted {
            tracing::warn!(
                booking_id = %booking_id,
                provider_id = %provider_id,
                discarded_status = %current.status,
                "Booking released after work had started"
            );
        } else {
            tracing::info!(booking_id = %booking_id, provider_id = %provider_id, "Booking rejected");
        }

        Ok(())
    }

    /// Move a held booking one step along the delivery pipeline.
    pub async fn advance_status(
        &self,
        actor: Actor,
        booking_id: Uuid,
        requested: BookingStatus,
    ) -> AppResult<BookingView> {
        let provider_id = require_provider(actor)?;
        let current = self.find(booking_id).await?;

        if !current.is_held_by(provider_id) {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        check_advance(current.status, requested)?;

        let result = booking::Entity::update_many()
            .set(booking::ActiveModel {
                status: Set(requested),
                updated_at: Set(Utc::now().fixed_offset()),
                ..Default::default()
            })
            .filter(booking::Column::Id.eq(booking_id))
            .filter(booking::Column::ProviderId.eq(provider_id))
            .filter(booking::Column::Status.eq(current.status))
            .exec(&self.db)
            .await?;

        let updated = self.find(booking_id).await?;

        if result.rows_affected == 0 {
            // Someone moved it between our read and write; judge against what is stored now.
            if !updated.is_held_by(provider_id) {
                return Err(AppError::Forbidden("Forbidden".to_string()));
            }
            check_advance(updated.status, requested)?;
            return Err(AppError::Conflict("Booking changed concurrently, retry".to_string()));
        }

        tracing::info!(
            booking_id = %booking_id,
            provider_id = %provider_id,
            from = %current.status,
            to = %requested,
            "Booking status advanced"
        );

        self.present(&updated).await
    }

    /// Fetch one booking. A provider looking at a delivery in progress also
    /// gets the nearby pending bookings, when they can be computed.
    pub async fn get_by_id(&self, actor: Actor, booking_id: Uuid) -> AppResult<BookingView> {
        let booking = self.find(booking_id).await?;

        let permitted = match actor {
            Actor::Admin(_) => true,
            Actor::Customer(id) => booking.customer_id == id,
            Actor::Provider(id) => booking.is_held_by(id),
        };
        if !permitted {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        let mut view = self.present(&booking).await?;

        if matches!(actor, Actor::Provider(_)) && is_active(booking.status) {
            view.nearby_bookings = self.try_nearby(&booking).await.filter(|n| !n.is_empty());
        }

        Ok(view)
    }

    /// Nearby pending bookings for a specific reference booking, regardless of
    /// its status. Open to the holding provider, or any provider while unassigned.
    pub async fn nearby_for_route(&self, actor: Actor, booking_id: Uuid) -> AppResult<RouteView> {
        let provider_id = require_provider(actor)?;
        let booking = self.find(booking_id).await?;

        if booking.provider_id.is_some_and(|holder| holder != provider_id) {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        let nearby_bookings = self.nearby_candidates(&booking).await?;
        let related = RelatedRecords::load(&self.db, std::slice::from_ref(&booking)).await?;

        Ok(RouteView {
            current_booking: related.nearby(&booking),
            nearby_bookings,
        })
    }

    /// Store a proof-of-delivery attachment for a held booking.
    pub async fn attach_file(
        &self,
        actor: Actor,
        booking_id: Uuid,
        upload: Option<Upload>,
    ) -> AppResult<file::Model> {
        let provider_id = require_provider(actor)?;
        let booking = self.find(booking_id).await?;

        if !booking.is_held_by(provider_id) {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        let upload = upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&upload.file_name));
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to prepare upload directory: {}", e)))?;
        tokio::fs::write(self.upload_dir.join(&stored_name), &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store file: {}", e)))?;

        let record = file::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            file_url: Set(format!("/uploads/{}", stored_name)),
            kind: Set(FileKind::from_content_type(&upload.content_type)),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            booking_id = %booking.id,
            file_id = %record.id,
            kind = ?record.kind,
            size = upload.bytes.len(),
            "File attached"
        );

        Ok(record)
    }

    async fn find(&self, booking_id: Uuid) -> AppResult<booking::Model> {
        booking::Entity::find_by_id(booking_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    async fn pending_pool(&self, excluding: Option<Uuid>) -> AppResult<Vec<booking::Model>> {
        let mut query = booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Pending))
            .filter(booking::Column::ProviderId.is_null());

        if let Some(id) = excluding {
            query = query.filter(booking::Column::Id.ne(id));
        }

        Ok(query
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn nearby_candidates(&self, reference: &booking::Model) -> AppResult<Vec<NearbyBooking>> {
        let pool = self.pending_pool(Some(reference.id)).await?;
        let nearby = find_nearby(reference.pickup_point(), pool, Some(self.radius_km));
        let related = RelatedRecords::load(&self.db, &nearby).await?;

        Ok(nearby.iter().map(|b| related.nearby(b)).collect())
    }

    async fn try_nearby(&self, reference: &booking::Model) -> Option<Vec<NearbyBooking>> {
        match self.nearby_candidates(reference).await {
            Ok(nearby) => Some(nearby),
            Err(e) => {
                tracing::warn!(booking_id = %reference.id, error = %e, "Nearby lookup failed");
                None
            }
        }
    }

    async fn present(&self, booking: &booking::Model) -> AppResult<BookingView> {
        let related = RelatedRecords::load(&self.db, std::slice::from_ref(booking)).await?;
        Ok(related.view(booking))
    }

    async fn present_all(&self, bookings: &[booking::Model]) -> AppResult<Vec<BookingView>> {
        let related = RelatedRecords::load(&self.db, bookings).await?;
        Ok(bookings.iter().map(|b| related.view(b)).collect())
    }
}

fn require_provider(actor: Actor) -> AppResult<Uuid> {
    match actor {
        Actor::Provider(id) => Ok(id),
        _ => Err(AppError::Forbidden("Provider access required".to_string())),
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
