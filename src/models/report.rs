// src/models/report.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// Janelas de tempo aceitas pelo relatório.
// Valores desconhecidos viram `Other` e caem no mês corrente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TimeFrame {
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub time_frame: Option<TimeFrame>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    // Por padrão só faturas pagas entram no relatório
    #[serde(default)]
    pub include_unpaid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// Linha crua da agregação (uma por produto)
#[derive(Debug, Clone, FromRow)]
pub struct SalesAggregateRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub category: Option<String>,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
    pub total_invoices: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: Uuid,
    pub product_name: String,
    pub category: Option<String>,
    pub total_quantity: i64,
    pub kilograms: Decimal,
    pub total_revenue: Decimal,
    pub total_invoices: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_revenue: Decimal,
    pub total_quantity: i64,
    pub total_kilograms: Decimal,
    pub total_invoices: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub data: Vec<ProductSales>,
    pub summary: SalesSummary,
    pub date_range: DateWindow,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopSellingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TopSellingRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub category: Option<String>,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopSellingProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub category: Option<String>,
    pub total_quantity: i64,
    pub kilograms: Decimal,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMonth {
    // "YYYY-MM"
    pub month: String,
    pub invoice_count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMonths {
    pub months: Vec<ActiveMonth>,
    pub count: usize,
    pub date_range: DateWindow,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: i64,
    pub total_products: i64,
    pub total_invoices: i64,
    pub total_revenue: Decimal,
}

// Linha de estoque do relatório enviado por e-mail
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub name: String,
    pub category: String,
    pub stock: i32,
    pub kilograms: Decimal,
    pub price: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub sales: SalesReport,
    pub stock: Vec<StockLine>,
    pub total_stock_value: Decimal,
    // Receita / kg; ausente quando nada foi vendido
    pub net_sales_average: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailReportResponse {
    pub success: bool,
    pub recipients: usize,
    pub date_range: DateWindow,
}
