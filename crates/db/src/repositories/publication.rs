//! Publication repository.

use std::sync::Arc;

use crate::entities::{
    Publication, PublicationAuthor, PublicationTag, Tag, Topic, User, publication,
    publication_author, publication_tag, tag, topic, user,
};
use crate::repositories::filter::contains_ci;
use noxa_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Query, SelectStatement},
};

/// Publication repository for database operations.
#[derive(Clone)]
pub struct PublicationRepository {
    db: Arc<DatabaseConnection>,
}

fn topic_ids_matching(q: &str) -> SelectStatement {
    Query::select()
        .column(topic::Column::Id)
        .from(Topic)
        .and_where(contains_ci((Topic, topic::Column::Name), q))
        .to_owned()
}

fn publication_ids_with_tag_matching(q: &str) -> SelectStatement {
    Query::select()
        .column(publication_tag::Column::PublicationId)
        .from(PublicationTag)
        .and_where(
            publication_tag::Column::TagId.in_subquery(
                Query::select()
                    .column(tag::Column::Id)
                    .from(Tag)
                    .and_where(contains_ci((Tag, tag::Column::Name), q))
                    .to_owned(),
            ),
        )
        .to_owned()
}

fn publication_ids_with_author_matching(q: &str) -> SelectStatement {
    Query::select()
        .column(publication_author::Column::PublicationId)
        .from(PublicationAuthor)
        .and_where(
            publication_author::Column::UserId.in_subquery(
                Query::select()
                    .column(user::Column::Id)
                    .from(User)
                    .and_where(contains_ci((User, user::Column::Username), q))
                    .to_owned(),
            ),
        )
        .to_owned()
}

/// Free-text filter used by the home listing: theme, description, topic
/// name, tag name or author username contains `q` (case-insensitive).
///
/// Matches go through `IN` subqueries so a publication is returned once no
/// matter how many tags or authors match.
#[must_use]
pub fn listing_filter(q: &str) -> Condition {
    Condition::any()
        .add(contains_ci((Publication, publication::Column::Theme), q))
        .add(contains_ci((Publication, publication::Column::Description), q))
        .add(publication::Column::TopicId.in_subquery(topic_ids_matching(q)))
        .add(publication::Column::Id.in_subquery(publication_ids_with_tag_matching(q)))
        .add(publication::Column::Id.in_subquery(publication_ids_with_author_matching(q)))
}

/// The listing filter widened with summary and affiliations, for global search.
#[must_use]
pub fn search_filter(q: &str) -> Condition {
    listing_filter(q)
        .add(contains_ci((Publication, publication::Column::Summary), q))
        .add(contains_ci((Publication, publication::Column::Affiliations), q))
}

impl PublicationRepository {
    /// Create a new publication repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a publication by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<publication::Model>> {
        Publication::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a publication by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<publication::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PublicationNotFound(id.to_string()))
    }

    /// Insert a publication.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: publication::ActiveModel,
    ) -> AppResult<publication::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attach an author.
    pub async fn add_author_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: publication_author::ActiveModel,
    ) -> AppResult<publication_author::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attach a tag.
    pub async fn add_tag_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: publication_tag::ActiveModel,
    ) -> AppResult<publication_tag::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Authors of a publication.
    pub async fn find_authors(&self, publication_id: &str) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(
                user::Column::Id.in_subquery(
                    Query::select()
                        .column(publication_author::Column::UserId)
                        .from(PublicationAuthor)
                        .and_where(publication_author::Column::PublicationId.eq(publication_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(user::Column::Username)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Listing for the home page, optionally filtered by free text.
    pub async fn list(&self, q: Option<&str>) -> AppResult<Vec<publication::Model>> {
        let mut query = Publication::find();
        if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(listing_filter(q));
        }

        query
            .order_by_desc(publication::Column::UpdatedAt)
            .order_by_desc(publication::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Publications sharing the topic or at least one tag with `publication`.
    pub async fn find_similar(
        &self,
        publication: &publication::Model,
        limit: u64,
    ) -> AppResult<Vec<publication::Model>> {
        let shared_tag = publication::Column::Id.in_subquery(
            Query::select()
                .column(publication_tag::Column::PublicationId)
                .from(PublicationTag)
                .and_where(
                    publication_tag::Column::TagId.in_subquery(
                        Query::select()
                            .column(publication_tag::Column::TagId)
                            .from(PublicationTag)
                            .and_where(
                                publication_tag::Column::PublicationId.eq(publication.id.as_str()),
                            )
                            .to_owned(),
                    ),
                )
                .to_owned(),
        );

        let mut related = Condition::any().add(shared_tag);
        if let Some(topic_id) = &publication.topic_id {
            related = related.add(publication::Column::TopicId.eq(topic_id.as_str()));
        }

        Publication::find()
            .filter(publication::Column::Id.ne(publication.id.as_str()))
            .filter(related)
            .order_by_desc(publication::Column::UpdatedAt)
            .order_by_desc(publication::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Publications a user is an author of.
    pub async fn find_by_author(&self, user_id: &str) -> AppResult<Vec<publication::Model>> {
        Publication::find()
            .filter(
                publication::Column::Id.in_subquery(
                    Query::select()
                        .column(publication_author::Column::PublicationId)
                        .from(PublicationAuthor)
                        .and_where(publication_author::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .order_by_desc(publication::Column::UpdatedAt)
            .order_by_desc(publication::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Global search over publications.
    pub async fn search(&self, q: &str, limit: u64) -> AppResult<Vec<publication::Model>> {
        Publication::find()
            .filter(search_filter(q))
            .order_by_desc(publication::Column::UpdatedAt)
            .order_by_desc(publication::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    fn create_test_publication(id: &str, topic_id: Option<&str>) -> publication::Model {
        let now = Utc::now().into();
        publication::Model {
            id: id.to_string(),
            owner_id: Some("owner1".to_string()),
            topic_id: topic_id.map(ToString::to_string),
            theme: "Graph neural networks".to_string(),
            affiliations: "ENSAE".to_string(),
            description: "desc".to_string(),
            summary: "sum".to_string(),
            file_key: format!("pdf/{id}-paper.pdf"),
            file_name: "paper.pdf".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_listing_filter_covers_all_fields() {
        let sql = Publication::find()
            .filter(listing_filter("ml"))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("LOWER(\"publication\".\"theme\")"));
        assert!(sql.contains("LOWER(\"publication\".\"description\")"));
        assert!(sql.contains("LOWER(\"topic\".\"name\")"));
        assert!(sql.contains("LOWER(\"tag\".\"name\")"));
        assert!(sql.contains("LOWER(\"user\".\"username\")"));
        assert!(sql.contains(" OR "));
        assert!(!sql.contains("summary"));
    }

    #[test]
    fn test_search_filter_adds_summary_and_affiliations() {
        let sql = Publication::find()
            .filter(search_filter("ml"))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("LOWER(\"publication\".\"summary\")"));
        assert!(sql.contains("LOWER(\"publication\".\"affiliations\")"));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<publication::Model>::new()])
                .into_connection(),
        );

        let repo = PublicationRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::PublicationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_without_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_publication("p2", None),
                    create_test_publication("p1", None),
                ]])
                .into_connection(),
        );

        let repo = PublicationRepository::new(db);
        let list = repo.list(Some("   ")).await.unwrap();
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn test_find_similar() {
        let source = create_test_publication("p1", Some("t1"));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_publication("p2", Some("t1"))]])
                .into_connection(),
        );

        let repo = PublicationRepository::new(db);
        let similar = repo.find_similar(&source, 10).await.unwrap();
        assert_eq!(similar.len(), 1);
        assert_ne!(similar[0].id, source.id);
    }
}
