//! Authentication endpoints: registration, login and logout.

use axum::{Router, extract::State, routing::get};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use noxa_common::AppResult;
use noxa_core::{RegisterInput, UserResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    extractors::{FormData, JsonOrForm, MaybeAuthUser, SessionToken},
    middleware::{AppState, SESSION_COOKIE},
    response::ApiResponse,
};

/// Values pre-filled in the registration form.
#[derive(Serialize)]
pub struct RegisterDefaults {
    pub school: String,
    pub photo: String,
}

/// Registration form defaults.
async fn register_form(State(state): State<AppState>) -> ApiResponse<RegisterDefaults> {
    let (school, photo) = state.user_service.registration_defaults();
    ApiResponse::ok(RegisterDefaults { school, photo })
}

/// Create a new account from a multipart form.
async fn register(
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<UserResponse>> {
    let input: RegisterInput = form.parse()?;
    let photo = form.take_file("photo");

    let user = state.user_service.register(input, photo).await?;

    Ok(ApiResponse::ok(UserResponse::from(user))
        .success("Registration successful. Please sign in."))
}

/// Whether the caller already has a session.
#[derive(Serialize)]
pub struct LoginState {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

async fn login_form(user: MaybeAuthUser) -> ApiResponse<LoginState> {
    ApiResponse::ok(LoginState {
        authenticated: user.0.is_some(),
        user: user.0.map(UserResponse::from),
    })
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response. The token is also set as the session cookie.
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Sign in and open a session.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonOrForm(req): JsonOrForm<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let output = match state.user_service.login(&req.username, &req.password).await {
        Ok(output) => output,
        Err(e) => {
            info!(username = %req.username, success = false, "Login attempt");
            return Err(e);
        }
    };
    info!(username = %req.username, success = true, "Login attempt");

    let cookie = Cookie::build((SESSION_COOKIE, output.token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((
        jar.add(cookie),
        ApiResponse::ok(LoginResponse {
            token: output.token,
            user: output.user.into(),
        })
        .success("Signed in successfully."),
    ))
}

/// Close the session and clear the cookie.
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    SessionToken(token): SessionToken,
) -> AppResult<(CookieJar, ApiResponse<()>)> {
    state.user_service.logout(token.as_deref()).await?;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, ApiResponse::ok(()).info("You have been signed out.")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}
