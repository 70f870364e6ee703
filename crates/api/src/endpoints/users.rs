//! Profile and follow endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use noxa_common::{AppError, AppResult};
use noxa_core::{CollectionSummary, FollowResult, FollowStats, UpdateProfileInput, UserResponse};
use noxa_db::entities::{publication, topic, user};
use serde::Serialize;

use crate::{
    extractors::{AuthUser, FormData},
    middleware::AppState,
    response::ApiResponse,
};

/// The signed-in user's own account, email included.
#[derive(Serialize)]
pub struct AccountResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub email: String,
}

impl From<user::Model> for AccountResponse {
    fn from(user: user::Model) -> Self {
        let email = user.email.clone();
        Self {
            user: user.into(),
            email,
        }
    }
}

/// Profile page contents.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub publications: Vec<publication::Model>,
    #[serde(flatten)]
    pub follow: FollowStats,
    pub collections: Vec<CollectionSummary>,
    pub favorite_topics: Vec<topic::Model>,
}

/// Show a profile.
async fn profile(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let user = state.user_service.get(&user_id).await?;
    let publications = state.publication_service.by_author(&user.id).await?;
    let follow = state
        .following_service
        .stats(&user.id, Some(&viewer.id))
        .await?;
    let collections = state.collection_service.list_with_counts(&user.id).await?;
    let favorite_topics = state.topic_service.favorites(&user.id).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: user.into(),
        publications,
        follow,
        collections,
        favorite_topics,
    }))
}

/// Current values of the profile form.
async fn edit_profile_form(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<AccountResponse>> {
    if viewer.id != user_id {
        return Err(AppError::Forbidden(
            "you can only edit your own profile".to_string(),
        ));
    }
    let user = state.user_service.get(&user_id).await?;
    Ok(ApiResponse::ok(AccountResponse::from(user)))
}

/// Save the profile form.
async fn edit_profile(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    mut form: FormData,
) -> AppResult<ApiResponse<AccountResponse>> {
    let input: UpdateProfileInput = form.parse()?;
    let photo = form.take_file("photo");

    let user = state
        .user_service
        .update_profile(&viewer.id, &user_id, input, photo)
        .await?;

    Ok(ApiResponse::ok(AccountResponse::from(user)).success("Profile updated successfully."))
}

async fn follow(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<FollowResult>> {
    let result = state.following_service.follow(&viewer, &user_id).await?;

    let response = ApiResponse::ok(result);
    Ok(match result {
        FollowResult::Followed => response.success("You are now following this user."),
        FollowResult::AlreadyFollowing => response.info("You are already following this user."),
    })
}

/// Unfollow response.
#[derive(Serialize)]
pub struct UnfollowResponse {
    pub unfollowed: bool,
}

async fn unfollow(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<UnfollowResponse>> {
    let unfollowed = state.following_service.unfollow(&viewer.id, &user_id).await?;

    let response = ApiResponse::ok(UnfollowResponse { unfollowed });
    Ok(if unfollowed {
        response.success("You unfollowed this user.")
    } else {
        response.info("You were not following this user.")
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{user_id}", get(profile))
        .route(
            "/edit-profile/{user_id}",
            get(edit_profile_form).post(edit_profile),
        )
        .route("/follow-user/{user_id}", post(follow))
        .route("/unfollow-user/{user_id}", post(unfollow))
}
