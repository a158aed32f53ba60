/// Signup, login and refresh-token rotation
///
/// A principal holds at most one live refresh token. Every login or refresh
/// replaces it; presenting anything else clears it and forces a new login.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::TokenService;
use crate::auth::password::CredentialVerifier;
use crate::auth::refresh_token::{fingerprint, matches_stored};
use crate::error::{AppError, AuthError, CredentialsFailure, DatabaseError};
use crate::store::{Principal, PrincipalStore};

/// Access + refresh token pair handed to clients
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Hashed at startup and verified against when a login names an unknown
/// email, so both failure paths pay for one bcrypt verification.
const TIMING_PASSWORD: &str = "timing-equalisation-password";

/// Runs the credential and token flows against a principal store
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn PrincipalStore>,
    tokens: TokenService,
    verifier: CredentialVerifier,
    timing_hash: Arc<String>,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn PrincipalStore>,
        tokens: TokenService,
        verifier: CredentialVerifier,
    ) -> Self {
        // An unusable cost also fails every signup, so an empty hash is fine here
        let timing_hash = verifier.hash(TIMING_PASSWORD).unwrap_or_default();
        Self {
            store,
            tokens,
            verifier,
            timing_hash: Arc::new(timing_hash),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn store(&self) -> &Arc<dyn PrincipalStore> {
        &self.store
    }

    /// Create a principal for `email` with a hashed `password`
    ///
    /// # Errors
    /// - `AccountConflict` if the email is already registered
    pub async fn signup(&self, email: &str, password: &str) -> Result<Principal, AppError> {
        if self.store.find_principal_by_email(email).await?.is_some() {
            return Err(AuthError::AccountConflict.into());
        }

        let password_hash = self.hash_blocking(password.to_string()).await?;
        let principal = Principal::new(email, password_hash);

        match self.store.save(&principal).await {
            Ok(()) => {}
            // Lost a race with a concurrent signup for the same email
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_))) => {
                return Err(AuthError::AccountConflict.into());
            }
            Err(e) => return Err(e),
        }

        tracing::info!(user_id = %principal.id, "Principal created");
        Ok(principal)
    }

    /// Verify credentials and start a new token chain
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email or wrong password
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let principal = match self.store.find_principal_by_email(email).await? {
            Some(principal) => principal,
            None => {
                self.verify_blocking(password.to_string(), self.timing_hash.to_string())
                    .await?;
                return Err(AppError::invalid_credentials(CredentialsFailure::WrongPassword));
            }
        };

        let matches = self
            .verify_blocking(password.to_string(), principal.password_hash.clone())
            .await?;
        if !matches {
            return Err(AppError::invalid_credentials(CredentialsFailure::WrongPassword));
        }

        let pair = self.issue_pair(&principal.email)?;
        self.store
            .set_refresh_token(principal.id, Some(&fingerprint(&pair.refresh_token)))
            .await?;

        tracing::info!(user_id = %principal.id, "Principal logged in");
        Ok(pair)
    }

    /// Exchange the current refresh token for a fresh pair
    ///
    /// # Errors
    /// - `InvalidCredentials` if the token fails validation or is not the
    ///   principal's current refresh token (the stored token is then cleared)
    /// - `PrincipalNotFound` if the token's subject no longer exists
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AppError> {
        let email = self.tokens.decode_refresh_subject(presented)?;

        let principal = self
            .store
            .find_principal_by_email(&email)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if !matches_stored(principal.refresh_token_hash.as_deref(), presented) {
            tracing::warn!(user_id = %principal.id, "Superseded refresh token presented");
            self.revoke(principal.id).await?;
            return Err(AppError::invalid_credentials(CredentialsFailure::TokenReused));
        }

        let pair = self.issue_pair(&email)?;
        let swapped = self
            .store
            .swap_refresh_token(
                principal.id,
                &fingerprint(presented),
                Some(&fingerprint(&pair.refresh_token)),
            )
            .await?;

        if !swapped {
            // A concurrent refresh rotated the token after we read it
            tracing::warn!(user_id = %principal.id, "Concurrent refresh token use detected");
            self.revoke(principal.id).await?;
            return Err(AppError::invalid_credentials(CredentialsFailure::TokenReused));
        }

        tracing::info!(user_id = %principal.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Resolve the principal behind an access token
    ///
    /// # Errors
    /// - `InvalidCredentials` if the token is invalid or its subject is unknown
    pub async fn authenticate(&self, access_token: &str) -> Result<Principal, AppError> {
        let email = self.tokens.decode_access_subject(access_token)?;

        self.store
            .find_principal_by_email(&email)
            .await?
            .ok_or_else(|| AppError::invalid_credentials(CredentialsFailure::UnknownSubject))
    }

    fn issue_pair(&self, subject: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access_token(subject, None)?,
            refresh_token: self.tokens.issue_refresh_token(subject, None)?,
            token_type: "bearer",
        })
    }

    async fn revoke(&self, id: Uuid) -> Result<(), AppError> {
        match self.store.set_refresh_token(id, None).await {
            // Deleted meanwhile; nothing left to revoke
            Err(AppError::Database(DatabaseError::NotFound(_))) => Ok(()),
            result => result,
        }
    }

    // bcrypt blocks for the configured cost; run it off the async workers
    async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        let verifier = self.verifier;
        tokio::task::spawn_blocking(move || verifier.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, AppError> {
        let verifier = self.verifier;
        tokio::task::spawn_blocking(move || verifier.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
    }
}
