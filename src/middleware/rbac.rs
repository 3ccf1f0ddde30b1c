// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedAdmin,
    models::admin::AdminRole,
};

/// 1. O Trait que define o papel exigido
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> AdminRole;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .ok_or(AppError::InvalidToken)?;

        if !admin.0.is_verified {
            return Err(AppError::NotVerified);
        }

        let required = T::role();
        if admin.0.role != required {
            return Err(AppError::Forbidden(required.as_str()));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn role() -> AdminRole {
        AdminRole::Admin
    }
}

pub type RequireAdmin = RequireRole<AdminOnly>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::admin::Admin;
    use axum::http::Request;
    use chrono::Utc;
    use uuid::Uuid;

    fn parts_with(role: AdminRole, is_verified: bool) -> Parts {
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(AuthenticatedAdmin(Admin {
            id: Uuid::new_v4(),
            first_name: "Kamala".into(),
            last_name: "Silva".into(),
            email: "kamala@example.com".into(),
            username: "kamala".into(),
            role,
            is_verified,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }));
        parts
    }

    #[tokio::test]
    async fn admin_role_passes() {
        let mut parts = parts_with(AdminRole::Admin, true);
        assert!(RequireAdmin::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn viewer_is_forbidden() {
        let mut parts = parts_with(AdminRole::Viewer, true);
        let result = RequireAdmin::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Forbidden("admin"))));
    }

    #[tokio::test]
    async fn unverified_admin_is_rejected() {
        let mut parts = parts_with(AdminRole::Admin, false);
        let result = RequireAdmin::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::NotVerified)));
    }

    #[tokio::test]
    async fn anonymous_request_is_unauthorized() {
        let (mut parts, _) = Request::new(()).into_parts();
        let result = RequireAdmin::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }
}
