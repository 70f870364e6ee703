//! Create topic, tag, publication and authorship tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Topic::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Topic::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Topic::Name).string_len(200).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_topic_name")
                    .table(Topic::Table)
                    .col(Topic::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tag::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Tag::Name).string_len(100).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tag_name")
                    .table(Tag::Table)
                    .col(Tag::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Publication::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Publication::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Publication::OwnerId).string_len(32))
                    .col(ColumnDef::new(Publication::TopicId).string_len(32))
                    .col(ColumnDef::new(Publication::Theme).string_len(200).not_null())
                    .col(ColumnDef::new(Publication::Affiliations).text().not_null())
                    .col(ColumnDef::new(Publication::Description).text().not_null())
                    .col(ColumnDef::new(Publication::Summary).text().not_null())
                    .col(ColumnDef::new(Publication::FileKey).string_len(512).not_null())
                    .col(ColumnDef::new(Publication::FileName).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Publication::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Publication::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_publication_owner")
                            .from(Publication::Table, Publication::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_publication_topic")
                            .from(Publication::Table, Publication::TopicId)
                            .to(Topic::Table, Topic::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (updated_at, created_at) (for the home listing order)
        manager
            .create_index(
                Index::create()
                    .name("idx_publication_updated_created")
                    .table(Publication::Table)
                    .col(Publication::UpdatedAt)
                    .col(Publication::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_publication_topic_id")
                    .table(Publication::Table)
                    .col(Publication::TopicId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PublicationAuthor::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PublicationAuthor::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PublicationAuthor::PublicationId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PublicationAuthor::UserId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_publication_author_publication")
                            .from(PublicationAuthor::Table, PublicationAuthor::PublicationId)
                            .to(Publication::Table, Publication::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_publication_author_user")
                            .from(PublicationAuthor::Table, PublicationAuthor::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (publication_id, user_id) - an author is listed once
        manager
            .create_index(
                Index::create()
                    .name("idx_publication_author_unique")
                    .table(PublicationAuthor::Table)
                    .col(PublicationAuthor::PublicationId)
                    .col(PublicationAuthor::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_publication_author_user_id")
                    .table(PublicationAuthor::Table)
                    .col(PublicationAuthor::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PublicationTag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PublicationTag::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PublicationTag::PublicationId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PublicationTag::TagId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_publication_tag_publication")
                            .from(PublicationTag::Table, PublicationTag::PublicationId)
                            .to(Publication::Table, Publication::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_publication_tag_tag")
                            .from(PublicationTag::Table, PublicationTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_publication_tag_unique")
                    .table(PublicationTag::Table)
                    .col(PublicationTag::PublicationId)
                    .col(PublicationTag::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_publication_tag_tag_id")
                    .table(PublicationTag::Table)
                    .col(PublicationTag::TagId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PublicationTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PublicationAuthor::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Publication::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Topic::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Topic {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Publication {
    Table,
    Id,
    OwnerId,
    TopicId,
    Theme,
    Affiliations,
    Description,
    Summary,
    FileKey,
    FileName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PublicationAuthor {
    Table,
    Id,
    PublicationId,
    UserId,
}

#[derive(Iden)]
enum PublicationTag {
    Table,
    Id,
    PublicationId,
    TagId,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
