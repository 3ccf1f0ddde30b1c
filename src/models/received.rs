// src/models/received.rs
//
// Notas de entrada (mercadoria recebida do fornecedor).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::product::validate_money;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedItem {
    #[serde(skip)]
    pub received_invoice_id: Uuid,
    pub line_no: i32,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReceivedInvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub date: NaiveDate,
    pub supplier: String,
    pub notes: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedInvoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub date: NaiveDate,
    pub supplier: String,
    pub items: Vec<ReceivedItem>,
    pub notes: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReceivedInvoice {
    pub fn from_parts(row: ReceivedInvoiceRow, items: Vec<ReceivedItem>) -> Self {
        Self {
            id: row.id,
            invoice_number: row.invoice_number,
            date: row.date,
            supplier: row.supplier,
            items,
            notes: row.notes,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn assemble(rows: Vec<ReceivedInvoiceRow>, items: Vec<ReceivedItem>) -> Vec<Self> {
        let mut by_receipt: HashMap<Uuid, Vec<ReceivedItem>> = HashMap::new();
        for item in items {
            by_receipt.entry(item.received_invoice_id).or_default().push(item);
        }
        rows.into_iter()
            .map(|row| {
                let items = by_receipt.remove(&row.id).unwrap_or_default();
                Self::from_parts(row, items)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedItemPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000."))]
    pub quantity: i32,
    // Custo unitário cobrado pelo fornecedor
    #[validate(custom(function = "validate_money"))]
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedInvoicePayload {
    // Só é lido na criação; ausente = próximo número gerado
    pub invoice_number: Option<String>,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Supplier is required."))]
    pub supplier: String,
    #[validate(length(min = 1, message = "A receipt needs at least one item."), nested)]
    pub items: Vec<ReceivedItemPayload>,
    #[serde(default)]
    pub notes: String,
}
