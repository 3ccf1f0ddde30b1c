// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{common::error::AppError, config::AppState, models::admin::Admin};

// Nome do cookie httpOnly da sessão
pub const SESSION_COOKIE: &str = "NextSalesApp";

// Admin autenticado, inserido nos "extensions" pelo auth_guard
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub Admin);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Cookie primeiro; `Authorization: Bearer` como alternativa para clientes de API.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(headers))
}

pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, request.headers()).ok_or(AppError::InvalidToken)?;
    let admin = app_state.auth_service.authenticate(&token).await?;

    request.extensions_mut().insert(AuthenticatedAdmin(admin));
    Ok(next.run(request).await)
}

// Contas ainda não verificadas só enxergam /api/admin/me
pub async fn require_verified(request: Request, next: Next) -> Result<Response, AppError> {
    let admin = request
        .extensions()
        .get::<AuthenticatedAdmin>()
        .ok_or(AppError::InvalidToken)?;
    if !admin.0.is_verified {
        return Err(AppError::NotVerified);
    }
    Ok(next.run(request).await)
}

// Extrator para obter o admin autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
