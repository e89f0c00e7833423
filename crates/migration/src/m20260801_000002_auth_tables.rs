use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Magic-link tokens. Only the hash of the raw token is ever stored.
        manager
            .create_table(
                Table::create()
                    .table(MagicLinkTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MagicLinkTokens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MagicLinkTokens::Email).string().not_null())
                    .col(
                        ColumnDef::new(MagicLinkTokens::TokenHash)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(MagicLinkTokens::ExpiresAt).big_integer().not_null())
                    .col(ColumnDef::new(MagicLinkTokens::UsedAt).big_integer())
                    .col(ColumnDef::new(MagicLinkTokens::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(MagicLinkTokens::DeletedAt).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_magic_link_tokens_email")
                    .table(MagicLinkTokens::Table)
                    .col(MagicLinkTokens::Email)
                    .to_owned(),
            )
            .await?;

        // Sessions (bearer tokens issued after magic-link verification).
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Sessions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Sessions::AccessToken)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sessions::ExpiresAt).big_integer().not_null())
                    .col(ColumnDef::new(Sessions::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Sessions::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_user_id")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_user_id")
                    .table(Sessions::Table)
                    .col(Sessions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MagicLinkTokens::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MagicLinkTokens {
    Table,
    Id,
    Email,
    TokenHash,
    ExpiresAt,
    UsedAt,
    CreatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    UserId,
    AccessToken,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}
