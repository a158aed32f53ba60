/// JWT Claims structure
///
/// Access and refresh tokens share one claim set. They differ only in
/// `scope`, which every decode checks.

use serde::{Deserialize, Serialize};

/// What a token may be used for
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Access,
    Refresh,
}

/// Claims carried by every token this service signs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (principal email)
    pub sub: String,
    pub scope: TokenScope,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token id, keeps two tokens minted in the same second distinct
    pub jti: String,
}

impl Claims {
    /// Create claims for `subject` expiring `ttl` from now.
    /// A negative `ttl` yields an already-expired token.
    pub fn new(subject: &str, scope: TokenScope, ttl: chrono::Duration) -> Self {
        let now = chrono::Utc::now();
        Self {
            sub: subject.to_string(),
            scope,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Scope claim as found on an incoming token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PresentedScope {
    /// No `scope` claim (legacy access tokens)
    #[default]
    Missing,
    Known(TokenScope),
    Unrecognized(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScope {
    Known(TokenScope),
    Other(serde_json::Value),
}

/// Lenient view of a verified token's payload.
///
/// `exp` is required and checked by `jsonwebtoken` against the raw payload;
/// `sub` and `scope` are checked by the token service so failures carry a
/// precise reason.
#[derive(Debug, Deserialize)]
pub struct PresentedClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "presented_scope")]
    pub scope: PresentedScope,
}

fn presented_scope<'de, D>(deserializer: D) -> Result<PresentedScope, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<RawScope>::deserialize(deserializer)? {
        None => PresentedScope::Missing,
        Some(RawScope::Known(scope)) => PresentedScope::Known(scope),
        Some(RawScope::Other(value)) => PresentedScope::Unrecognized(value.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("test@example.com", TokenScope::Access, chrono::Duration::hours(1));

        assert_eq!(claims.sub, "test@example.com");
        assert_eq!(claims.scope, TokenScope::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_same_second_claims_differ() {
        let first = Claims::new("a@b.com", TokenScope::Refresh, chrono::Duration::minutes(1));
        let second = Claims::new("a@b.com", TokenScope::Refresh, chrono::Duration::minutes(1));
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_scope_serializes_lowercase() {
        let claims = Claims::new("a@b.com", TokenScope::Refresh, chrono::Duration::minutes(1));
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["scope"], "refresh");
        assert_eq!(json["sub"], "a@b.com");
    }

    #[test]
    fn test_presented_scope_variants() {
        let missing: PresentedClaims = serde_json::from_str(r#"{"sub":"a@b.com","exp":1}"#).unwrap();
        let known: PresentedClaims =
            serde_json::from_str(r#"{"sub":"a@b.com","scope":"access","exp":1}"#).unwrap();
        let other: PresentedClaims =
            serde_json::from_str(r#"{"sub":"a@b.com","scope":"refresh_token","exp":1}"#).unwrap();

        assert_eq!(missing.scope, PresentedScope::Missing);
        assert_eq!(known.scope, PresentedScope::Known(TokenScope::Access));
        assert!(matches!(other.scope, PresentedScope::Unrecognized(_)));
    }

    #[test]
    fn test_missing_subject_is_none() {
        let claims: PresentedClaims = serde_json::from_str(r#"{"scope":"access","exp":1}"#).unwrap();
        assert!(claims.sub.is_none());
    }
}
