/// Authentication Routes
///
/// Signup, login, refresh-token rotation and current principal lookup.

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{validate_password_strength, Authenticator};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::middleware::{bearer_token, AuthenticatedUser};
use crate::validators::is_valid_email;

/// Signup and login request body
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Signup response
#[derive(Serialize)]
pub struct SignupResponse {
    pub new_user: String,
}

/// Current principal
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub confirmed: bool,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

/// POST /signup
///
/// # Errors
/// - 400: invalid email or weak password
/// - 409: email already registered
pub async fn signup(
    form: web::Json<CredentialsRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("signup");

    let email = is_valid_email(&form.email)?;
    validate_password_strength(&form.password)?;

    let principal = authenticator.signup(&email, &form.password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %principal.id,
        "User signed up"
    );

    Ok(HttpResponse::Created().json(SignupResponse {
        new_user: principal.email,
    }))
}

/// POST /login
///
/// Unknown email and wrong password yield the same 401 so accounts
/// cannot be enumerated.
pub async fn login(
    form: web::Json<CredentialsRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("login");

    let pair = authenticator
        .login(form.email.trim(), &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Ok().json(pair))
}

/// GET /refresh_token
///
/// Takes the refresh token as a bearer credential and rotates it.
///
/// # Errors
/// - 401: invalid, expired, wrongly scoped or superseded token
/// - 404: the token's principal no longer exists
pub async fn refresh_token(
    req: HttpRequest,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("refresh_token");

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AuthError::MissingToken)?;

    let pair = authenticator.refresh(token).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    Ok(HttpResponse::Ok().json(pair))
}

/// GET /me
///
/// **Requires a valid access token**; the principal is injected by `JwtMiddleware`.
pub async fn get_current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    let principal = user.into_inner().principal;

    HttpResponse::Ok().json(UserResponse {
        id: principal.id.to_string(),
        email: principal.email,
        confirmed: principal.confirmed,
        avatar_url: principal.avatar_url,
        created_at: principal.created_at.to_rfc3339(),
    })
}
