use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;
use super::m20250301_000004_create_services::Service;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::CustomerId).not_null())
                    .col(uuid_null(Booking::ProviderId))
                    .col(integer(Booking::ServiceId).not_null())
                    .col(double(Booking::PickupLat).not_null())
                    .col(double(Booking::PickupLng).not_null())
                    .col(text(Booking::PickupAddress).not_null())
                    .col(double(Booking::DropLat).not_null())
                    .col(double(Booking::DropLng).not_null())
                    .col(text(Booking::DropAddress).not_null())
                    .col(string_len(Booking::Status, 20).not_null())
                    .col(timestamp_with_time_zone(Booking::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Booking::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Booking::Table, Booking::CustomerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_provider")
                            .from(Booking::Table, Booking::ProviderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_service")
                            .from(Booking::Table, Booking::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Pending-pool scans filter on (status, provider_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_status_provider")
                    .table(Booking::Table)
                    .col(Booking::Status)
                    .col(Booking::ProviderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    CustomerId,
    ProviderId,
    ServiceId,
    PickupLat,
    PickupLng,
    PickupAddress,
    DropLat,
    DropLng,
    DropAddress,
    Status,
    CreatedAt,
    UpdatedAt,
}
