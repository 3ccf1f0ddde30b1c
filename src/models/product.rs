// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Produto do catálogo. A categoria é texto livre e codifica o peso por unidade.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub stock: i32,
    pub entire_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// As colunas de dinheiro são NUMERIC(14, 2)
// 99_999_999_999_999 × 10^-2 (lo/mid/hi words of the 96-bit mantissa)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Valor representável em centavos, sem arredondamento pelo banco.
pub fn is_whole_cents(val: &Decimal) -> bool {
    val.round_dp(2) == *val
}

pub(crate) fn validate_money(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("Value cannot be negative.".into());
        return Err(err);
    }
    if !is_whole_cents(val) {
        let mut err = ValidationError::new("scale");
        err.message = Some("Value must have at most two decimal places.".into());
        return Err(err);
    }
    if *val > MAX_AMOUNT {
        let mut err = ValidationError::new("range");
        err.message = Some("Value is too large.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Category is required."))]
    pub category: String,
    #[validate(custom(function = "validate_money"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    #[serde(default)]
    pub stock: i32,
    #[validate(range(min = 0, message = "Entire stock cannot be negative."))]
    #[serde(default)]
    pub entire_stock: i32,
}

// Atualização manual (correções de inventário incluídas)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Category is required."))]
    pub category: String,
    #[validate(custom(function = "validate_money"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    pub stock: Option<i32>,
    #[validate(range(min = 0, message = "Entire stock cannot be negative."))]
    pub entire_stock: Option<i32>,
}
