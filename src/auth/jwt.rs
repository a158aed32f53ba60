/// JWT Token Generation and Validation
///
/// `TokenService` signs and decodes access and refresh tokens with a single
/// shared secret. The secret is handed over at construction and never
/// changes for the lifetime of the service.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, PresentedClaims, PresentedScope, TokenScope};
use crate::configuration::JwtSettings;
use crate::error::{AppError, ConfigError, CredentialsFailure};

/// Issues and validates signed, scoped tokens
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Build a token service from validated settings
    ///
    /// # Errors
    /// Returns error if the secret or algorithm is unacceptable
    pub fn new(config: &JwtSettings) -> Result<Self, ConfigError> {
        config.validate()?;
        let algorithm = config.signing_algorithm()?;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_token_expiry),
            refresh_ttl: Duration::seconds(config.refresh_token_expiry),
        })
    }

    /// Sign a short-lived access token for `subject`
    ///
    /// # Errors
    /// Returns error if token encoding fails
    pub fn issue_access_token(
        &self,
        subject: &str,
        ttl: Option<Duration>,
    ) -> Result<String, AppError> {
        self.issue(subject, TokenScope::Access, ttl.unwrap_or(self.access_ttl))
    }

    /// Sign a long-lived refresh token for `subject`
    ///
    /// # Errors
    /// Returns error if token encoding fails
    pub fn issue_refresh_token(
        &self,
        subject: &str,
        ttl: Option<Duration>,
    ) -> Result<String, AppError> {
        self.issue(subject, TokenScope::Refresh, ttl.unwrap_or(self.refresh_ttl))
    }

    fn issue(&self, subject: &str, scope: TokenScope, ttl: Duration) -> Result<String, AppError> {
        let claims = Claims::new(subject, scope, ttl);

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Validate an access token and return its subject
    ///
    /// Tokens without a scope claim are accepted as legacy access tokens.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` if the token is malformed, tampered with,
    /// expired, carries a non-access scope or has no subject
    pub fn decode_access_subject(&self, token: &str) -> Result<String, AppError> {
        let claims = self.verify(token)?;

        match claims.scope {
            PresentedScope::Missing | PresentedScope::Known(TokenScope::Access) => {}
            other => {
                tracing::warn!(scope = ?other, "Access token has wrong scope");
                return Err(AppError::invalid_credentials(CredentialsFailure::WrongScope));
            }
        }

        claims
            .sub
            .ok_or_else(|| AppError::invalid_credentials(CredentialsFailure::MissingSubject))
    }

    /// Validate a refresh token and return its subject
    ///
    /// # Errors
    /// Returns `InvalidCredentials` if the token is malformed, tampered with,
    /// expired, is not refresh-scoped or has no subject
    pub fn decode_refresh_subject(&self, token: &str) -> Result<String, AppError> {
        let claims = self.verify(token)?;

        if claims.scope != PresentedScope::Known(TokenScope::Refresh) {
            tracing::warn!(scope = ?claims.scope, "Refresh token has wrong scope");
            return Err(AppError::invalid_credentials(CredentialsFailure::WrongScope));
        }

        claims
            .sub
            .ok_or_else(|| AppError::invalid_credentials(CredentialsFailure::MissingSubject))
    }

    /// Check signature and expiry, with no leeway on `exp`
    fn verify(&self, token: &str) -> Result<PresentedClaims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<PresentedClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => CredentialsFailure::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        CredentialsFailure::BadSignature
                    }
                    _ => CredentialsFailure::Malformed,
                };
                tracing::debug!(error = %e, reason = ?reason, "JWT validation error");
                AppError::invalid_credentials(reason)
            })
    }
}
