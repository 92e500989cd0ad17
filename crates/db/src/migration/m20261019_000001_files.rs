//! Files migration.
//!
//! Creates the files table holding one record per stored blob. Built with the
//! schema builder so the same migration runs on Postgres and SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Files::Id)
                            .string_len(255)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Files::OwnerId).string().not_null())
                    .col(
                        ColumnDef::new(Files::StorageClass)
                            .string_len(16)
                            .not_null()
                            .check(Expr::col(Files::StorageClass).is_in(["internal", "external"])),
                    )
                    .col(ColumnDef::new(Files::LogicalPath).string().not_null())
                    .col(
                        ColumnDef::new(Files::StoredPath)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Files::Size)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Files::Size).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Files::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves both list scopes: (class, prefix) and (class, owner, prefix).
        manager
            .create_index(
                Index::create()
                    .name("idx_files_scope")
                    .table(Files::Table)
                    .col(Files::StorageClass)
                    .col(Files::OwnerId)
                    .col(Files::LogicalPath)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Files::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    OwnerId,
    StorageClass,
    LogicalPath,
    StoredPath,
    Size,
    CreatedAt,
}
