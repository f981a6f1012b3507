use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Provider::Table)
                    .if_not_exists()
                    .col(pk_auto(Provider::Id))
                    .col(uuid(Provider::UserId).not_null().unique_key())
                    .col(text_null(Provider::Skills))
                    .col(boolean(Provider::Availability).not_null().default(true))
                    .col(timestamp_with_time_zone(Provider::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_provider_user")
                            .from(Provider::Table, Provider::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Provider::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Provider {
    Table,
    Id,
    UserId,
    Skills,
    Availability,
    CreatedAt,
}
