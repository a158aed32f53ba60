/// Authentication module
///
/// Password hashing, scoped JWT issuance/validation and refresh token
/// rotation.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use jwt::TokenService;
pub use password::{validate_password_strength, CredentialVerifier};
pub use refresh_token::fingerprint;
pub use session::{Authenticator, TokenPair};
