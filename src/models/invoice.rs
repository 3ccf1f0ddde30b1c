// src/models/invoice.rs

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::product::validate_money;

// --- LINHAS ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    #[serde(skip)]
    pub invoice_id: Uuid,
    pub line_no: i32,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

// Linha já resolvida contra o catálogo, pronta para gravar
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

pub fn line_total(quantity: i32, price: Decimal) -> Decimal {
    Decimal::from(quantity) * price
}

pub fn lines_total(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(|l| l.total).sum()
}

// --- FATURA ---

// Linha da tabela `invoices` (snapshot do cliente "achatado")
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub date: NaiveDate,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub epf_number: Option<String>,
    pub is_paid: bool,
    pub advance: Decimal,
    pub is_cancelled: bool,
    pub total: Decimal,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub date: NaiveDate,
    pub customer_id: Uuid,
    pub customer_details: CustomerDetails,
    pub epf_number: Option<String>,
    pub items: Vec<InvoiceItem>,
    pub is_paid: bool,
    pub advance: Decimal,
    pub is_cancelled: bool,
    pub total: Decimal,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn from_parts(row: InvoiceRow, items: Vec<InvoiceItem>) -> Self {
        Self {
            id: row.id,
            invoice_number: row.invoice_number,
            date: row.date,
            customer_id: row.customer_id,
            customer_details: CustomerDetails {
                name: row.customer_name,
                address: row.customer_address,
                phone: row.customer_phone,
                email: row.customer_email,
            },
            epf_number: row.epf_number,
            items,
            is_paid: row.is_paid,
            advance: row.advance,
            is_cancelled: row.is_cancelled,
            total: row.total,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    /// Junta as linhas às faturas, preservando a ordem das faturas.
    pub fn assemble(rows: Vec<InvoiceRow>, items: Vec<InvoiceItem>) -> Vec<Self> {
        let mut by_invoice: HashMap<Uuid, Vec<InvoiceItem>> = HashMap::new();
        for item in items {
            by_invoice.entry(item.invoice_id).or_default().push(item);
        }
        rows.into_iter()
            .map(|row| {
                let items = by_invoice.remove(&row.id).unwrap_or_default();
                Self::from_parts(row, items)
            })
            .collect()
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000."))]
    pub quantity: i32,
    // Se ausente, usa o preço atual do produto
    #[validate(custom(function = "validate_money"))]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    // Se ausente, o próximo número é gerado
    pub invoice_number: Option<String>,
    pub date: NaiveDate,
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "An invoice needs at least one item."), nested)]
    pub items: Vec<InvoiceItemPayload>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_paid: bool,
    #[validate(custom(function = "validate_money"))]
    #[serde(default)]
    pub advance: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoicePayload {
    pub date: NaiveDate,
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "An invoice needs at least one item."), nested)]
    pub items: Vec<InvoiceItemPayload>,
    #[serde(default)]
    pub notes: String,
    pub is_paid: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvancePaymentPayload {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

impl RecentQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(5).clamp(1, 50)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextNumberResponse {
    pub next_number: String,
}

// --- FILTROS DA LISTAGEM ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    Unpaid,
    Cancelled,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub status_filter: Option<StatusFilter>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
