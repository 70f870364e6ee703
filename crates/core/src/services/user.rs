//! User service: registration, login sessions and profile edits.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use noxa_common::{
    AppError, AppResult, Config, IdGenerator, IncomingFile, PHOTO_PREFIX, StorageBackend,
    slug_with_suffix, slugify, storage_key,
};
use noxa_db::{
    entities::{session, user},
    repositories::{SessionRepository, UserRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::{Validate, ValidateUrl, ValidationError};

/// Input for registering a new account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password1: String,

    /// Confirmation, must equal `password1`.
    pub password2: String,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[validate(length(max = 255))]
    pub school: Option<String>,

    #[validate(length(max = 5000))]
    pub bio: Option<String>,

    #[validate(url)]
    pub linkedin: Option<String>,

    #[validate(url)]
    pub github: Option<String>,
}

impl RegisterInput {
    fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.first_name = non_blank(self.first_name);
        self.last_name = non_blank(self.last_name);
        self.school = non_blank(self.school);
        self.bio = non_blank(self.bio);
        self.linkedin = non_blank(self.linkedin);
        self.github = non_blank(self.github);
        self
    }
}

/// Input for editing a profile.
///
/// Absent fields are left untouched; blank optional fields are cleared.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    /// Blank keeps the current school.
    #[validate(length(max = 255))]
    pub school: Option<String>,

    #[validate(length(max = 5000))]
    pub bio: Option<String>,

    /// Blank clears the link.
    #[validate(custom(function = "blank_or_url"))]
    pub linkedin: Option<String>,

    #[validate(custom(function = "blank_or_url"))]
    pub github: Option<String>,
}

impl UpdateProfileInput {
    fn normalized(mut self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        self.email = trim(self.email);
        self.first_name = trim(self.first_name);
        self.last_name = trim(self.last_name);
        self.school = trim(self.school);
        self.bio = trim(self.bio);
        self.linkedin = trim(self.linkedin);
        self.github = trim(self.github);
        self
    }
}

fn blank_or_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

/// A user as shown to other users. The email address is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub school: String,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    /// Storage key of the profile photo, served under the media URL.
    pub photo: String,
    pub slug: String,
    pub nb_documents: i32,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            school: user.school,
            bio: user.bio,
            linkedin: user.linkedin,
            github: user.github,
            photo: user.photo,
            slug: user.slug,
            nb_documents: user.nb_documents,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Convert a list of users into their public form.
#[must_use]
pub fn public_users(users: Vec<user::Model>) -> Vec<UserResponse> {
    users.into_iter().map(UserResponse::from).collect()
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub token: String,
    pub user: user::Model,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    session_repo: SessionRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    default_school: String,
    default_photo: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        session_repo: SessionRepository,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            storage,
            id_gen: IdGenerator::new(),
            default_school: config.profile.default_school.clone(),
            default_photo: config.profile.default_photo.clone(),
        }
    }

    /// The defaults a registration form starts with.
    #[must_use]
    pub fn registration_defaults(&self) -> (String, String) {
        (self.default_school.clone(), self.default_photo.clone())
    }

    /// Register a new account.
    pub async fn register(
        &self,
        input: RegisterInput,
        photo: Option<IncomingFile>,
    ) -> AppResult<user::Model> {
        if input.password1 != input.password2 {
            return Err(AppError::Validation(
                "The two password fields didn't match".to_string(),
            ));
        }

        let input = input.normalized();
        input.validate()?;

        if self.user_repo.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }

        let password_hash = hash_password(&input.password1)?;
        let slug = self.unique_slug(&input.username).await?;

        let photo_key = match photo {
            Some(file) => Some(self.store_photo(&file).await?),
            None => None,
        };

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            school: Set(input.school.unwrap_or_else(|| self.default_school.clone())),
            bio: Set(input.bio),
            linkedin: Set(input.linkedin),
            github: Set(input.github),
            photo: Set(photo_key.clone().unwrap_or_else(|| self.default_photo.clone())),
            slug: Set(slug),
            nb_documents: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        match self.user_repo.create(model).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "User registered");
                Ok(user)
            }
            Err(e) => {
                if let Some(key) = photo_key {
                    self.discard_file(&key).await;
                }
                Err(e)
            }
        }
    }

    /// Check credentials and open a session.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutput> {
        let Some(user) = self.user_repo.find_by_username(username.trim()).await? else {
            debug!(username, "Login failed: unknown user");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.id_gen.generate_token();
        self.session_repo
            .create(session::ActiveModel {
                id: Set(token.clone()),
                user_id: Set(user.id.clone()),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        info!(user_id = %user.id, "User logged in");
        Ok(LoginOutput { token, user })
    }

    /// Close a session. Always succeeds for unknown or missing tokens.
    pub async fn logout(&self, token: Option<&str>) -> AppResult<()> {
        if let Some(token) = token {
            self.session_repo.delete(token).await?;
        }
        info!("User logged out");
        Ok(())
    }

    /// Resolve a session token to its user.
    pub async fn authenticate_session(&self, token: &str) -> AppResult<Option<user::Model>> {
        self.session_repo.find_user_by_token(token).await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Edit a profile. Only the owner of the profile may do this.
    pub async fn update_profile(
        &self,
        actor_id: &str,
        user_id: &str,
        input: UpdateProfileInput,
        photo: Option<IncomingFile>,
    ) -> AppResult<user::Model> {
        if actor_id != user_id {
            return Err(AppError::Forbidden(
                "you can only edit your own profile".to_string(),
            ));
        }

        let input = input.normalized();
        input.validate()?;
        let user = self.user_repo.get_by_id(user_id).await?;

        if let Some(email) = input.email.as_deref() {
            if email != user.email
                && self
                    .user_repo
                    .find_by_email(email)
                    .await?
                    .is_some_and(|other| other.id != user.id)
            {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }

        let previous_photo = user.photo.clone();
        let mut active = user.into_active_model();

        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(school) = non_blank(input.school) {
            active.school = Set(school);
        }
        if let Some(first_name) = input.first_name {
            active.first_name = Set(non_blank(Some(first_name)));
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(non_blank(Some(last_name)));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(non_blank(Some(bio)));
        }
        if let Some(linkedin) = input.linkedin {
            active.linkedin = Set(non_blank(Some(linkedin)));
        }
        if let Some(github) = input.github {
            active.github = Set(non_blank(Some(github)));
        }

        let new_photo = match photo {
            Some(file) => {
                let key = self.store_photo(&file).await?;
                active.photo = Set(key.clone());
                Some(key)
            }
            None => None,
        };
        active.updated_at = Set(Some(Utc::now().into()));

        match self.user_repo.update(active).await {
            Ok(updated) => {
                if new_photo.is_some() && previous_photo != self.default_photo {
                    self.discard_file(&previous_photo).await;
                }
                info!(user_id = %updated.id, "Profile updated");
                Ok(updated)
            }
            Err(e) => {
                if let Some(key) = new_photo {
                    self.discard_file(&key).await;
                }
                Err(e)
            }
        }
    }

    /// First free slug in the sequence `base`, `base-1`, `base-2`, ...
    async fn unique_slug(&self, username: &str) -> AppResult<String> {
        let base = slugify(username);
        let mut n = 0;
        loop {
            let candidate = slug_with_suffix(&base, n);
            if !self.user_repo.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    async fn store_photo(&self, file: &IncomingFile) -> AppResult<String> {
        let key = storage_key(PHOTO_PREFIX, &file.file_name);
        self.storage
            .upload(&key, &file.data, &file.content_type)
            .await?;
        Ok(key)
    }

    async fn discard_file(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(key, error = %e, "Failed to remove stored file");
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Hash a password with Argon2 and a random salt.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::create_test_user;
    use maplit::btreemap;
    use noxa_common::LocalStorage;
    use noxa_common::config::{DatabaseConfig, ProfileConfig, ServerConfig, StorageConfig};
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn create_test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                url: "http://localhost:8000".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/noxa".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            storage: StorageConfig::default(),
            profile: ProfileConfig::default(),
        }
    }

    fn service_with(db: MockDatabase) -> UserService {
        let db = Arc::new(db.into_connection());
        let dir = std::env::temp_dir().join(format!("noxa-user-{}", IdGenerator::new().generate()));
        UserService::new(
            UserRepository::new(db.clone()),
            SessionRepository::new(db),
            Arc::new(LocalStorage::new(dir)),
            &create_test_config(),
        )
    }

    fn register_input(username: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            password1: "correct horse battery".to_string(),
            password2: "correct horse battery".to_string(),
            first_name: None,
            last_name: Some("  ".to_string()),
            school: None,
            bio: None,
            linkedin: Some(String::new()),
            github: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    #[test]
    fn test_password_hash_verifies_only_original() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("s3cret-pasS", &hash).unwrap());
        assert!(!hash.contains("s3cret-pass"));
    }

    #[tokio::test]
    async fn test_register_password_mismatch_writes_nothing() {
        // Empty mock: any query would fail the test.
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let mut input = register_input("alice");
        input.password2 = "something else".to_string();

        let result = service.register(input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_email_rejected() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let mut input = register_input("alice");
        input.email = "not-an-email".to_string();

        let result = service.register(input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflict() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", "alice")]]),
        );

        let result = service.register(register_input("alice"), None).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_resolves_slug_collision() {
        let mut stored = create_test_user("u2", "Alice Smith");
        stored.slug = "alice-smith-2".to_string();

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                // username and email lookups
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([Vec::<user::Model>::new()])
                // "alice-smith" and "alice-smith-1" taken, "alice-smith-2" free
                .append_query_results([[count_row(1)]])
                .append_query_results([[count_row(1)]])
                .append_query_results([[count_row(0)]])
                .append_query_results([[stored]]),
        );

        let user = service
            .register(register_input("Alice Smith"), None)
            .await
            .unwrap();
        assert_eq!(user.slug, "alice-smith-2");
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_user_look_the_same() {
        let mut alice = create_test_user("u1", "alice");
        alice.password_hash = hash_password("right-password").unwrap();

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let wrong = service.login("alice", "wrong-password").await.unwrap_err();
        let unknown = service.login("nobody", "whatever").await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(wrong.public_message(), unknown.public_message());
    }

    #[tokio::test]
    async fn test_login_creates_session() {
        let mut alice = create_test_user("u1", "alice");
        alice.password_hash = hash_password("right-password").unwrap();

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .append_query_results([[session::Model {
                    id: "tok".to_string(),
                    user_id: "u1".to_string(),
                    created_at: Utc::now().into(),
                }]]),
        );

        let output = service.login("alice", "right-password").await.unwrap();
        assert_eq!(output.user.id, "u1");
        assert_eq!(output.token.len(), 32);
    }

    #[tokio::test]
    async fn test_logout_without_token_succeeds() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        assert!(service.logout(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_other_profile_forbidden() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let result = service
            .update_profile("u1", "u2", UpdateProfileInput::default(), None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_invalid_link() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let input = UpdateProfileInput {
            github: Some("not a url".to_string()),
            ..Default::default()
        };

        let result = service.update_profile("u1", "u1", input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_profile_trims_email_before_validation() {
        let mut updated = create_test_user("u1", "alice");
        updated.email = "alice@ensae.sn".to_string();

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", "alice")]])
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[updated]]),
        );
        let input = UpdateProfileInput {
            email: Some("  alice@ensae.sn ".to_string()),
            ..Default::default()
        };

        let user = service.update_profile("u1", "u1", input, None).await.unwrap();
        assert_eq!(user.email, "alice@ensae.sn");
    }

    #[tokio::test]
    async fn test_update_profile_blank_link_clears_it() {
        let mut current = create_test_user("u1", "alice");
        current.linkedin = Some("https://linkedin.com/in/alice".to_string());

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[current]])
                .append_query_results([[create_test_user("u1", "alice")]]),
        );
        let input = UpdateProfileInput {
            linkedin: Some("   ".to_string()),
            ..Default::default()
        };

        let user = service.update_profile("u1", "u1", input, None).await.unwrap();
        assert!(user.linkedin.is_none());
    }

    #[test]
    fn test_user_response_leaves_out_email() {
        let user = UserResponse::from(create_test_user("u1", "alice"));
        let json = serde_json::to_value(user).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("email").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
