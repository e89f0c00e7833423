use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users table.
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::EmailVerificationTokenHash).string())
                    .col(ColumnDef::new(Users::EmailVerificationExpiresAt).big_integer())
                    .col(ColumnDef::new(Users::EmailVerifiedAt).big_integer())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::DeletedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        // Visitors table.
        manager
            .create_table(
                Table::create()
                    .table(Visitors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Visitors::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Visitors::Name).string().not_null())
                    .col(ColumnDef::new(Visitors::OwnerId).string().not_null())
                    .col(ColumnDef::new(Visitors::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Visitors::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Visitors::DeletedAt).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visitors_owner_id")
                            .from(Visitors::Table, Visitors::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // SQLite cannot represent non-unique indexes as constraints.
        manager
            .create_index(
                Index::create()
                    .name("idx_visitors_owner_id")
                    .table(Visitors::Table)
                    .col(Visitors::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Locations table.
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Locations::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Locations::Name).string().not_null())
                    .col(ColumnDef::new(Locations::Nickname).string())
                    .col(ColumnDef::new(Locations::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Locations::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Locations::DeletedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        // Checkins table (the central mutable state record).
        manager
            .create_table(
                Table::create()
                    .table(Checkins::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Checkins::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Checkins::VisitorId).string().not_null())
                    .col(ColumnDef::new(Checkins::LocationId).string().not_null())
                    .col(ColumnDef::new(Checkins::CheckinAt).big_integer().not_null())
                    .col(ColumnDef::new(Checkins::EstCheckoutAt).big_integer().not_null())
                    .col(ColumnDef::new(Checkins::ActualCheckoutAt).big_integer())
                    .col(ColumnDef::new(Checkins::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Checkins::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Checkins::DeletedAt).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checkins_visitor_id")
                            .from(Checkins::Table, Checkins::VisitorId)
                            .to(Visitors::Table, Visitors::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checkins_location_id")
                            .from(Checkins::Table, Checkins::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_checkins_visitor_id")
                    .table(Checkins::Table)
                    .col(Checkins::VisitorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_checkins_location_id")
                    .table(Checkins::Table)
                    .col(Checkins::LocationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse dependency order.
        manager
            .drop_table(Table::drop().table(Checkins::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Visitors::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    EmailVerificationTokenHash,
    EmailVerificationExpiresAt,
    EmailVerifiedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Visitors {
    Table,
    Id,
    Name,
    OwnerId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Name,
    Nickname,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Checkins {
    Table,
    Id,
    VisitorId,
    LocationId,
    CheckinAt,
    EstCheckoutAt,
    ActualCheckoutAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
