//! Publication service.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use noxa_common::{
    AppError, AppResult, IdGenerator, IncomingFile, PDF_PREFIX, StorageBackend, has_pdf_extension,
    storage_key,
};
use noxa_db::{
    entities::{discussion, publication, publication_author, publication_tag, tag, topic, user},
    repositories::{
        DiscussionRepository, FollowingRepository, PublicationRepository, TagRepository,
        TopicRepository, UserRepository,
    },
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::notification::NotificationService;
use super::user::{UserResponse, public_users};

/// Maximum number of similar publications on a detail page.
const SIMILAR_LIMIT: u64 = 10;

/// Form fields of a new publication. The PDF travels separately.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreatePublicationInput {
    #[validate(length(max = 255))]
    pub theme: String,

    /// Topic name; created when it does not exist yet.
    #[validate(length(max = 255))]
    pub topic: String,

    /// Comma-separated affiliations.
    #[serde(default)]
    pub affiliations: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub summary: String,

    /// Comma-separated usernames of co-authors.
    #[serde(default)]
    pub authors: String,

    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: String,
}

/// Everything shown on a publication page.
#[derive(Debug, Clone, Serialize)]
pub struct PublicationDetail {
    pub publication: publication::Model,
    pub topic: Option<topic::Model>,
    pub tags: Vec<tag::Model>,
    pub authors: Vec<UserResponse>,
    pub affiliations: Vec<String>,
    pub discussions: Vec<discussion::Model>,
    pub similar: Vec<publication::Model>,
}

/// A stored PDF ready to be served.
#[derive(Debug, Clone)]
pub struct PdfFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Publication service for business logic.
#[derive(Clone)]
pub struct PublicationService {
    db: Arc<DatabaseConnection>,
    publication_repo: PublicationRepository,
    topic_repo: TopicRepository,
    tag_repo: TagRepository,
    user_repo: UserRepository,
    following_repo: FollowingRepository,
    discussion_repo: DiscussionRepository,
    notification_service: NotificationService,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl PublicationService {
    /// Create a new publication service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DatabaseConnection>,
        publication_repo: PublicationRepository,
        topic_repo: TopicRepository,
        tag_repo: TagRepository,
        user_repo: UserRepository,
        following_repo: FollowingRepository,
        discussion_repo: DiscussionRepository,
        notification_service: NotificationService,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            db,
            publication_repo,
            topic_repo,
            tag_repo,
            user_repo,
            following_repo,
            discussion_repo,
            notification_service,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Upload a PDF and register the publication.
    ///
    /// The file is stored first; if anything in the database transaction
    /// fails afterwards the stored file is removed again.
    pub async fn create(
        &self,
        owner: &user::Model,
        input: CreatePublicationInput,
        file: IncomingFile,
    ) -> AppResult<publication::Model> {
        if !has_pdf_extension(&file.file_name) {
            return Err(AppError::Validation(
                "Only PDF files are allowed".to_string(),
            ));
        }
        if input.theme.trim().is_empty() {
            return Err(AppError::Validation("Theme is required".to_string()));
        }
        if input.topic.trim().is_empty() {
            return Err(AppError::Validation("Topic is required".to_string()));
        }
        input.validate()?;

        let file_key = storage_key(PDF_PREFIX, &file.file_name);
        self.storage
            .upload(&file_key, &file.data, "application/pdf")
            .await?;

        match self
            .persist(owner, &input, &file_key, &file.file_name)
            .await
        {
            Ok(publication) => {
                info!(
                    user_id = %owner.id,
                    publication_id = %publication.id,
                    "Publication created"
                );
                Ok(publication)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&file_key).await {
                    warn!(key = %file_key, error = %cleanup, "Failed to remove orphaned PDF");
                }
                Err(e)
            }
        }
    }

    async fn persist(
        &self,
        owner: &user::Model,
        input: &CreatePublicationInput,
        file_key: &str,
        file_name: &str,
    ) -> AppResult<publication::Model> {
        let txn = noxa_db::begin(&self.db).await?;

        let topic = self.get_or_create_topic(&txn, input.topic.trim()).await?;
        let now = Utc::now();

        let publication = self
            .publication_repo
            .create_in(
                &txn,
                publication::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    owner_id: Set(Some(owner.id.clone())),
                    topic_id: Set(Some(topic.id)),
                    theme: Set(input.theme.trim().to_string()),
                    affiliations: Set(input.affiliations.trim().to_string()),
                    description: Set(input.description.trim().to_string()),
                    summary: Set(input.summary.trim().to_string()),
                    file_key: Set(file_key.to_string()),
                    file_name: Set(file_name.to_string()),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                },
            )
            .await?;

        self.add_author(&txn, &publication.id, &owner.id).await?;

        let usernames: Vec<String> = split_csv(&input.authors)
            .into_iter()
            .filter(|name| *name != owner.username)
            .collect();
        let mut seen = HashSet::from([owner.id.clone()]);
        for author in self.user_repo.find_by_usernames_in(&txn, &usernames).await? {
            if seen.insert(author.id.clone()) {
                self.add_author(&txn, &publication.id, &author.id).await?;
            }
        }

        for name in split_csv(&input.tags) {
            let tag = self.get_or_create_tag(&txn, &name).await?;
            self.publication_repo
                .add_tag_in(
                    &txn,
                    publication_tag::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        publication_id: Set(publication.id.clone()),
                        tag_id: Set(tag.id),
                    },
                )
                .await?;
        }

        self.user_repo.increment_documents_in(&txn, &owner.id).await?;

        for follower_id in self.following_repo.follower_ids_in(&txn, &owner.id).await? {
            self.notification_service
                .new_publication_from_followed(&txn, &follower_id, owner, &publication)
                .await?;
        }

        noxa_db::commit(txn).await?;
        Ok(publication)
    }

    async fn add_author<C: ConnectionTrait>(
        &self,
        conn: &C,
        publication_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        self.publication_repo
            .add_author_in(
                conn,
                publication_author::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    publication_id: Set(publication_id.to_string()),
                    user_id: Set(user_id.to_string()),
                },
            )
            .await?;
        Ok(())
    }

    async fn get_or_create_topic<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> AppResult<topic::Model> {
        if let Some(topic) = self.topic_repo.find_by_name_in(conn, name).await? {
            return Ok(topic);
        }
        self.topic_repo
            .create_in(
                conn,
                topic::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    name: Set(name.to_string()),
                },
            )
            .await
    }

    async fn get_or_create_tag<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> AppResult<tag::Model> {
        if let Some(tag) = self.tag_repo.find_by_name_in(conn, name).await? {
            return Ok(tag);
        }
        self.tag_repo
            .create_in(
                conn,
                tag::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    name: Set(name.to_string()),
                },
            )
            .await
    }

    /// Home listing, optionally filtered by free text.
    pub async fn list(&self, q: Option<&str>) -> AppResult<Vec<publication::Model>> {
        self.publication_repo.list(q).await
    }

    /// Publications a user co-authored.
    pub async fn by_author(&self, user_id: &str) -> AppResult<Vec<publication::Model>> {
        self.publication_repo.find_by_author(user_id).await
    }

    /// Get a publication by ID.
    pub async fn get(&self, id: &str) -> AppResult<publication::Model> {
        self.publication_repo.get_by_id(id).await
    }

    /// Assemble the publication page.
    pub async fn detail(&self, id: &str) -> AppResult<PublicationDetail> {
        let publication = self.publication_repo.get_by_id(id).await?;

        let topic = match &publication.topic_id {
            Some(topic_id) => self.topic_repo.find_by_id(topic_id).await?,
            None => None,
        };
        let tags = self.tag_repo.find_by_publication(&publication.id).await?;
        let authors = self.publication_repo.find_authors(&publication.id).await?;
        let discussions = self
            .discussion_repo
            .find_by_publication(&publication.id)
            .await?;
        let similar = self
            .publication_repo
            .find_similar(&publication, SIMILAR_LIMIT)
            .await?;

        Ok(PublicationDetail {
            affiliations: publication.affiliations_list(),
            publication,
            topic,
            tags,
            authors: public_users(authors),
            discussions,
            similar,
        })
    }

    /// Load the stored PDF of a publication.
    pub async fn pdf(&self, id: &str) -> AppResult<PdfFile> {
        let publication = self.publication_repo.get_by_id(id).await?;

        let data = self
            .storage
            .read(&publication.file_key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("PDF file of publication {id}")))?;

        Ok(PdfFile {
            file_name: publication.file_name,
            data,
        })
    }
}

/// Split a comma-separated field: trimmed, blanks dropped, first occurrence kept.
fn split_csv(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter(|part| seen.insert(*part))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_publication, create_test_topic, create_test_user};
    use noxa_common::LocalStorage;
    use noxa_db::entities::following;
    use noxa_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("noxa-pub-{}", IdGenerator::new().generate()))
    }

    fn service_with(db: MockDatabase, dir: PathBuf) -> PublicationService {
        let db = Arc::new(db.into_connection());
        PublicationService::new(
            db.clone(),
            PublicationRepository::new(db.clone()),
            TopicRepository::new(db.clone()),
            TagRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            FollowingRepository::new(db.clone()),
            DiscussionRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
            Arc::new(LocalStorage::new(dir)),
        )
    }

    fn input() -> CreatePublicationInput {
        CreatePublicationInput {
            theme: "Graph Sampling".to_string(),
            topic: "Statistics".to_string(),
            affiliations: "ENSAE".to_string(),
            description: "desc".to_string(),
            summary: "sum".to_string(),
            authors: String::new(),
            tags: String::new(),
        }
    }

    fn pdf(name: &str) -> IncomingFile {
        IncomingFile {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4".to_vec(),
        }
    }

    #[test]
    fn test_split_csv() {
        assert_eq!(
            split_csv(" bob, ,alice,bob ,"),
            vec!["bob".to_string(), "alice".to_string()]
        );
        assert!(split_csv("").is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_non_pdf_before_any_io() {
        let dir = temp_dir();
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres), dir.clone());
        let owner = create_test_user("u1", "alice");

        let result = service.create(&owner, input(), pdf("paper.docx")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_create_requires_topic() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres), temp_dir());
        let owner = create_test_user("u1", "alice");
        let mut input = input();
        input.topic = "   ".to_string();

        let result = service.create(&owner, input, pdf("paper.pdf")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_failure_removes_stored_file() {
        // No query results queued: the topic lookup fails inside the transaction.
        let dir = temp_dir();
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres), dir.clone());
        let owner = create_test_user("u1", "alice");

        let result = service.create(&owner, input(), pdf("paper.pdf")).await;
        assert!(result.is_err());

        let leftovers = std::fs::read_dir(dir.join("pdf")).map_or(0, Iterator::count);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_create_adds_owner_as_author() {
        let dir = temp_dir();
        let stored = create_test_publication("p1", "u1");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_topic("t1", "Statistics")]])
                .append_query_results([[stored.clone()]])
                .append_query_results([[publication_author::Model {
                    id: "pa1".to_string(),
                    publication_id: "p1".to_string(),
                    user_id: "u1".to_string(),
                }]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([Vec::<following::Model>::new()]),
            dir,
        );
        let owner = create_test_user("u1", "alice");

        let publication = service.create(&owner, input(), pdf("paper.pdf")).await.unwrap();
        assert_eq!(publication.owner_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_pdf_missing_file_is_not_found() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_publication("p1", "u1")]]),
            temp_dir(),
        );

        let result = service.pdf("p1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pdf_unknown_publication() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<publication::Model>::new()]),
            temp_dir(),
        );

        let result = service.pdf("missing").await;
        assert!(matches!(result, Err(AppError::PublicationNotFound(_))));
    }
}
