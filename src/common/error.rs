// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

// O tipo de erro único da aplicação. Cada variante sabe o seu status HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("E-mail already in use")]
    EmailAlreadyExists,

    #[error("Username already in use")]
    UsernameAlreadyExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or missing authentication token")]
    InvalidToken,

    #[error("Account is not verified yet")]
    NotVerified,

    #[error("This action requires the '{0}' role")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for product '{0}'")]
    InsufficientStock(String),

    #[error("Invoice is cancelled")]
    InvoiceCancelled,

    #[error("Invoice is already paid")]
    InvoiceAlreadyPaid,

    #[error("{0}")]
    Conflict(String),

    #[error("Mail delivery is not configured")]
    MailNotConfigured,

    #[error("Mail delivery failed: {0}")]
    MailError(String),

    // Variante para erros de banco de dados
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) | AppError::InvalidAmount => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotVerified | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::UsernameAlreadyExists
            | AppError::InsufficientStock(_)
            | AppError::InvoiceCancelled
            | AppError::InvoiceAlreadyPaid
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MailNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MailError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::ValidationError(errors) = &self {
            let mut details = BTreeMap::new();
            collect_details("", errors, &mut details);
            let body = Json(json!({
                "error": "One or more fields are invalid.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        // Erros 500 não vazam o texto interno para o cliente
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal server error: {}", self);
            "An unexpected error occurred.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// Achata erros aninhados em chaves como `items[0].quantity`
fn collect_details(prefix: &str, errors: &ValidationErrors, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                });
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_details(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_details(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) = body_json(AppError::InternalServerError(anyhow::anyhow!(
            "connection refused on 10.0.0.3"
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An unexpected error occurred.");
    }

    #[tokio::test]
    async fn domain_errors_keep_their_message() {
        let (status, body) = body_json(AppError::InsufficientStock("Dust 2".into())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Insufficient stock for product 'Dust 2'");
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("length");
        err.message = Some("Name is required.".into());
        errors.add("name", err);

        let (status, body) = body_json(AppError::ValidationError(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["name"][0], "Name is required.");
    }

    #[derive(validator::Validate)]
    struct Line {
        #[validate(range(min = 1, message = "Quantity must be at least 1."))]
        quantity: i32,
    }

    #[derive(validator::Validate)]
    struct Document {
        #[validate(length(min = 1, message = "Supplier is required."))]
        supplier: String,
        #[validate(nested)]
        items: Vec<Line>,
    }

    #[tokio::test]
    async fn validation_errors_include_nested_list_fields() {
        use validator::Validate;

        let doc = Document {
            supplier: String::new(),
            items: vec![Line { quantity: 2 }, Line { quantity: 0 }],
        };
        let errors = doc.validate().unwrap_err();

        let (status, body) = body_json(AppError::ValidationError(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["supplier"][0], "Supplier is required.");
        assert_eq!(body["details"]["items[1].quantity"][0], "Quantity must be at least 1.");
        assert!(body["details"].get("items[0].quantity").is_none());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::NotFound("Invoice").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotVerified.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvoiceAlreadyPaid.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::MailNotConfigured.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
