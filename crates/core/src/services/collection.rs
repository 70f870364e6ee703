//! Collection service.

use std::sync::Arc;

use chrono::Utc;
use noxa_common::{AppError, AppResult, IdGenerator};
use noxa_db::{
    entities::{collection, collection_publication, publication},
    repositories::{CollectionRepository, PublicationRepository},
};
use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;
use tracing::info;

/// Maximum length of a collection name.
const MAX_NAME_LENGTH: usize = 200;

/// A collection with the number of publications in it.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    #[serde(flatten)]
    pub collection: collection::Model,
    pub publication_count: u64,
}

/// A publication inside a collection, with the time it was added.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionEntry {
    #[serde(flatten)]
    pub publication: publication::Model,
    pub added_at: chrono::DateTime<chrono::FixedOffset>,
}

/// Collection page contents.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionView {
    pub collection: collection::Model,
    pub publications: Vec<CollectionEntry>,
    /// All collections of the owner, for the sidebar.
    pub collections: Vec<CollectionSummary>,
}

/// Outcome of adding a publication to a named collection.
#[derive(Debug, Clone, Serialize)]
pub struct AddToCollection {
    pub collection: collection::Model,
    pub collection_created: bool,
    pub publication_added: bool,
}

/// Collection service for business logic.
#[derive(Clone)]
pub struct CollectionService {
    db: Arc<DatabaseConnection>,
    collection_repo: CollectionRepository,
    publication_repo: PublicationRepository,
    id_gen: IdGenerator,
}

impl CollectionService {
    /// Create a new collection service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        collection_repo: CollectionRepository,
        publication_repo: PublicationRepository,
    ) -> Self {
        Self {
            db,
            collection_repo,
            publication_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an empty collection.
    pub async fn create(&self, user_id: &str, name: &str) -> AppResult<collection::Model> {
        let name = validate_name(name)?;
        let created = self
            .collection_repo
            .create_in(self.db.as_ref(), self.new_collection(user_id, name))
            .await?;
        info!(user_id, collection_id = %created.id, "Collection created");
        Ok(created)
    }

    /// Add a publication to the user's collection called `name`, creating the
    /// collection when needed. Adding twice keeps a single entry.
    pub async fn add_publication(
        &self,
        user_id: &str,
        publication_id: &str,
        name: &str,
    ) -> AppResult<AddToCollection> {
        let name = validate_name(name)?;
        let publication = self.publication_repo.get_by_id(publication_id).await?;

        let txn = noxa_db::begin(&self.db).await?;

        let (collection, collection_created) = match self
            .collection_repo
            .find_by_user_and_name_in(&txn, user_id, name)
            .await?
        {
            Some(existing) => (existing, false),
            None => {
                let created = self
                    .collection_repo
                    .create_in(&txn, self.new_collection(user_id, name))
                    .await?;
                (created, true)
            }
        };

        let publication_added = if self
            .collection_repo
            .find_entry_in(&txn, &collection.id, &publication.id)
            .await?
            .is_some()
        {
            false
        } else {
            self.collection_repo
                .add_entry_in(
                    &txn,
                    collection_publication::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        collection_id: Set(collection.id.clone()),
                        publication_id: Set(publication.id.clone()),
                        added_at: Set(Utc::now().into()),
                    },
                )
                .await?;
            true
        };

        noxa_db::commit(txn).await?;

        info!(
            user_id,
            collection_id = %collection.id,
            publication_id = %publication.id,
            publication_added,
            "Publication added to collection"
        );
        Ok(AddToCollection {
            collection,
            collection_created,
            publication_added,
        })
    }

    /// Delete one of the user's collections.
    pub async fn delete(&self, user_id: &str, collection_id: &str) -> AppResult<()> {
        let collection = self.collection_repo.get_by_id(collection_id).await?;
        ensure_owner(&collection, user_id)?;

        self.collection_repo.delete(collection).await?;
        info!(user_id, collection_id, "Collection deleted");
        Ok(())
    }

    /// Remove a publication from one of the user's collections.
    pub async fn remove_publication(
        &self,
        user_id: &str,
        collection_id: &str,
        publication_id: &str,
    ) -> AppResult<bool> {
        let collection = self.collection_repo.get_by_id(collection_id).await?;
        let publication = self.publication_repo.get_by_id(publication_id).await?;
        ensure_owner(&collection, user_id)?;

        self.collection_repo
            .remove_entry(&collection.id, &publication.id)
            .await
    }

    /// The user's collections with their sizes.
    pub async fn list_with_counts(&self, user_id: &str) -> AppResult<Vec<CollectionSummary>> {
        let collections = self.collection_repo.find_by_user(user_id).await?;
        let mut summaries = Vec::with_capacity(collections.len());
        for collection in collections {
            let publication_count = self
                .collection_repo
                .count_publications(&collection.id)
                .await?;
            summaries.push(CollectionSummary {
                collection,
                publication_count,
            });
        }
        Ok(summaries)
    }

    /// A collection page. The collection must belong to `owner_id`.
    pub async fn view(&self, owner_id: &str, collection_id: &str) -> AppResult<CollectionView> {
        let collection = self
            .collection_repo
            .find_by_id(collection_id)
            .await?
            .filter(|c| c.user_id == owner_id)
            .ok_or_else(|| AppError::NotFound(format!("Collection {collection_id}")))?;

        let publications = self
            .collection_repo
            .find_publications(&collection.id)
            .await?
            .into_iter()
            .map(|(entry, publication)| CollectionEntry {
                publication,
                added_at: entry.added_at,
            })
            .collect();
        let collections = self.list_with_counts(owner_id).await?;

        Ok(CollectionView {
            collection,
            publications,
            collections,
        })
    }

    fn new_collection(&self, user_id: &str, name: &str) -> collection::ActiveModel {
        collection::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
    }
}

fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Collection name is required".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Collection name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

fn ensure_owner(collection: &collection::Model, user_id: &str) -> AppResult<()> {
    if collection.user_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you can only modify your own collections".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_collection, create_test_publication};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service_with(db: MockDatabase) -> CollectionService {
        let db = Arc::new(db.into_connection());
        CollectionService::new(
            db.clone(),
            CollectionRepository::new(db.clone()),
            PublicationRepository::new(db),
        )
    }

    fn entry(collection_id: &str, publication_id: &str) -> collection_publication::Model {
        collection_publication::Model {
            id: "e1".to_string(),
            collection_id: collection_id.to_string(),
            publication_id: publication_id.to_string(),
            added_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Reading list ").unwrap(), "Reading list");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[tokio::test]
    async fn test_add_creates_collection_on_first_use() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_publication("p1", "u2")]])
                .append_query_results([Vec::<collection::Model>::new()])
                .append_query_results([[create_test_collection("c1", "u1", "Reading")]])
                .append_query_results([Vec::<collection_publication::Model>::new()])
                .append_query_results([[entry("c1", "p1")]]),
        );

        let result = service.add_publication("u1", "p1", "Reading").await.unwrap();
        assert!(result.collection_created);
        assert!(result.publication_added);
    }

    #[tokio::test]
    async fn test_add_same_publication_twice_keeps_one_entry() {
        // Entry already present: no insert queued.
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_publication("p1", "u2")]])
                .append_query_results([[create_test_collection("c1", "u1", "Reading")]])
                .append_query_results([[entry("c1", "p1")]]),
        );

        let result = service.add_publication("u1", "p1", "Reading").await.unwrap();
        assert!(!result.collection_created);
        assert!(!result.publication_added);
    }

    #[tokio::test]
    async fn test_delete_foreign_collection_forbidden() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_collection("c1", "owner", "Reading")]]),
        );

        let result = service.delete("intruder", "c1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_view_wrong_owner_not_found() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_collection("c1", "owner", "Reading")]]),
        );

        let result = service.view("someone-else", "c1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
