//! Create search history and search suggestion tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchHistory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchHistory::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(SearchHistory::Query).string_len(255).not_null())
                    .col(ColumnDef::new(SearchHistory::SearchType).string_len(32).not_null())
                    .col(ColumnDef::new(SearchHistory::TargetKind).string_len(32))
                    .col(ColumnDef::new(SearchHistory::TargetId).string_len(32))
                    .col(
                        ColumnDef::new(SearchHistory::UsageCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(SearchHistory::LastUsed)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SearchHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_search_history_user")
                            .from(SearchHistory::Table, SearchHistory::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, last_used) (for recent searches and trimming)
        manager
            .create_index(
                Index::create()
                    .name("idx_search_history_user_last_used")
                    .table(SearchHistory::Table)
                    .col(SearchHistory::UserId)
                    .col(SearchHistory::LastUsed)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, query) (for upsert lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_search_history_user_query")
                    .table(SearchHistory::Table)
                    .col(SearchHistory::UserId)
                    .col(SearchHistory::Query)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchSuggestion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchSuggestion::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SearchSuggestion::Query)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SearchSuggestion::SearchCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(SearchSuggestion::LastSearched)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: search_count (for popularity ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_search_suggestion_search_count")
                    .table(SearchSuggestion::Table)
                    .col(SearchSuggestion::SearchCount)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchSuggestion::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SearchHistory {
    Table,
    Id,
    UserId,
    Query,
    SearchType,
    TargetKind,
    TargetId,
    UsageCount,
    LastUsed,
    CreatedAt,
}

#[derive(Iden)]
enum SearchSuggestion {
    Table,
    Id,
    Query,
    SearchCount,
    LastSearched,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
