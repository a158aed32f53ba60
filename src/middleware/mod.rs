/// Middleware module
///
/// Custom middleware for authentication.

mod jwt_middleware;

pub use jwt_middleware::{bearer_token, AuthenticatedUser, JwtMiddleware};
