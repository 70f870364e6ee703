//! Create discussion, participant and message tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Discussion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discussion::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Discussion::PublicationId).string_len(32).not_null())
                    .col(ColumnDef::new(Discussion::CreatorId).string_len(32).not_null())
                    .col(ColumnDef::new(Discussion::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Discussion::Description).text().not_null())
                    .col(
                        ColumnDef::new(Discussion::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Discussion::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discussion_publication")
                            .from(Discussion::Table, Discussion::PublicationId)
                            .to(Publication::Table, Publication::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discussion_creator")
                            .from(Discussion::Table, Discussion::CreatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discussion_publication_id")
                    .table(Discussion::Table)
                    .col(Discussion::PublicationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiscussionParticipant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscussionParticipant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DiscussionParticipant::DiscussionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscussionParticipant::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscussionParticipant::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discussion_participant_discussion")
                            .from(
                                DiscussionParticipant::Table,
                                DiscussionParticipant::DiscussionId,
                            )
                            .to(Discussion::Table, Discussion::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discussion_participant_user")
                            .from(DiscussionParticipant::Table, DiscussionParticipant::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discussion_participant_unique")
                    .table(DiscussionParticipant::Table)
                    .col(DiscussionParticipant::DiscussionId)
                    .col(DiscussionParticipant::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Message::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Message::DiscussionId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::ReplyToId).string_len(32))
                    .col(ColumnDef::new(Message::Body).text().not_null())
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Message::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_discussion")
                            .from(Message::Table, Message::DiscussionId)
                            .to(Discussion::Table, Discussion::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_user")
                            .from(Message::Table, Message::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_reply_to")
                            .from(Message::Table, Message::ReplyToId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (discussion_id, created_at) (for rendering a thread)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_discussion_created")
                    .table(Message::Table)
                    .col(Message::DiscussionId)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DiscussionParticipant::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Discussion::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Discussion {
    Table,
    Id,
    PublicationId,
    CreatorId,
    Title,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum DiscussionParticipant {
    Table,
    Id,
    DiscussionId,
    UserId,
    JoinedAt,
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    DiscussionId,
    UserId,
    ReplyToId,
    Body,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Publication {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
