//! Create collection and collection_publication tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collection::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collection::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Collection::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Collection::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Collection::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_user")
                            .from(Collection::Table, Collection::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, name) (for get-or-create by name)
        manager
            .create_index(
                Index::create()
                    .name("idx_collection_user_name")
                    .table(Collection::Table)
                    .col(Collection::UserId)
                    .col(Collection::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CollectionPublication::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionPublication::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CollectionPublication::CollectionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPublication::PublicationId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPublication::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_publication_collection")
                            .from(
                                CollectionPublication::Table,
                                CollectionPublication::CollectionId,
                            )
                            .to(Collection::Table, Collection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_publication_publication")
                            .from(
                                CollectionPublication::Table,
                                CollectionPublication::PublicationId,
                            )
                            .to(Publication::Table, Publication::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (collection_id, publication_id) - no duplicate membership
        manager
            .create_index(
                Index::create()
                    .name("idx_collection_publication_unique")
                    .table(CollectionPublication::Table)
                    .col(CollectionPublication::CollectionId)
                    .col(CollectionPublication::PublicationId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CollectionPublication::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Collection::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Collection {
    Table,
    Id,
    UserId,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CollectionPublication {
    Table,
    Id,
    CollectionId,
    PublicationId,
    AddedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Publication {
    Table,
    Id,
}
