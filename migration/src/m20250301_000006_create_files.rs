use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000005_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(File::Table)
                    .if_not_exists()
                    .col(uuid(File::Id).primary_key())
                    .col(uuid(File::BookingId).not_null())
                    .col(string_len(File::FileUrl, 512).not_null())
                    .col(string_len(File::Kind, 20).not_null())
                    .col(timestamp_with_time_zone(File::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_booking")
                            .from(File::Table, File::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(File::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum File {
    Table,
    Id,
    BookingId,
    FileUrl,
    Kind,
    CreatedAt,
}
