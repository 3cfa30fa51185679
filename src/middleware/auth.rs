use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::services::auth_service;

/// Identity attached to the request when a valid `x-auth-token` is presented.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
    pub token: String,
}

/// Verifies the `x-auth-token` header and attaches an [`AuthedUser`] to the
/// request. Never rejects: endpoints that require auth answer 401 themselves
/// when no identity was attached, so public and protected routes can share
/// one wrapped App.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(header_value) = req.headers().get("x-auth-token") {
            if let Ok(token) = header_value.to_str() {
                if let Ok(claims) = auth_service::verify_token(token) {
                    req.extensions_mut().insert(AuthedUser {
                        user_id: claims.sub,
                        token: token.to_string(),
                    });
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

/// Gate for handlers that require a signed-in caller.
pub fn require_auth(
    user: Option<web::ReqData<AuthedUser>>,
) -> Result<AuthedUser, HttpResponse> {
    match user {
        Some(user) => Ok(user.into_inner()),
        None => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "code": "unauthorized",
            "error": "No auth token, access denied",
        }))),
    }
}
