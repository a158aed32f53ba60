/// JWT Authentication Middleware
///
/// Validates the bearer access token, resolves its principal and injects it
/// into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::Authenticator;
use crate::error::{AppError, AuthError};
use crate::store::Principal;

/// Principal behind a validated access token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub principal: Principal,
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Protects a scope; requests without a valid access token get 401
pub struct JwtMiddleware {
    authenticator: Authenticator,
}

impl JwtMiddleware {
    pub fn new(authenticator: Authenticator) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    authenticator: Authenticator,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        let service = self.service.clone();
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            let token = token.ok_or_else(|| {
                tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
                AppError::Auth(AuthError::MissingToken)
            })?;

            let principal = authenticator.authenticate(&token).await?;
            tracing::debug!(user_id = %principal.id, "Access token validated");
            req.extensions_mut().insert(AuthenticatedUser { principal });

            service.call(req).await
        })
    }
}
