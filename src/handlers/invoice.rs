// src/handlers/invoice.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::PageQuery},
    config::AppState,
    middleware::rbac::RequireAdmin,
    models::{
        invoice::{
            AdvancePaymentPayload, CreateInvoicePayload, Invoice, InvoiceFilter,
            NextNumberResponse, RecentQuery, UpdateInvoicePayload,
        },
        report::{ActiveMonths, ReportQuery, SalesReport, TopSellingProduct, TopSellingQuery},
    },
};

// ---
// Leitura
// ---

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    responses((status = 200, description = "Todas as faturas", body = [Invoice])),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_invoices(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let invoices = app_state.invoice_service.list_all().await?;
    Ok(Json(invoices))
}

// Dois extratores Query: o flatten do serde quebra números vindos da URL
#[utoipa::path(
    get,
    path = "/api/invoices/paginated",
    tag = "Invoices",
    params(PageQuery, InvoiceFilter),
    responses((status = 200, description = "Página de faturas { data, pagination }")),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_invoices_paginated(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.invoice_service.list_page(&query, &filter).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/invoices/recent",
    tag = "Invoices",
    params(RecentQuery),
    responses((status = 200, description = "Últimas faturas criadas", body = [Invoice])),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn recent_invoices(
    State(app_state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let invoices = app_state.invoice_service.recent(query.limit()).await?;
    Ok(Json(invoices))
}

#[utoipa::path(
    get,
    path = "/api/invoices/next-number",
    tag = "Invoices",
    responses((status = 200, description = "Próximo número de fatura", body = NextNumberResponse)),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn next_invoice_number(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let next_number = app_state.invoice_service.next_number().await?;
    Ok(Json(NextNumberResponse { next_number }))
}

#[utoipa::path(
    get,
    path = "/api/invoices/top-selling",
    tag = "Reports",
    params(TopSellingQuery),
    responses((status = 200, description = "Produtos mais vendidos", body = [TopSellingProduct])),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn top_selling(
    State(app_state): State<AppState>,
    Query(query): Query<TopSellingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.report_service.top_selling(query.limit).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/invoices/sales-report",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Vendas por produto na janela", body = SalesReport),
        (status = 400, description = "Intervalo de datas inválido")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn sales_report(
    State(app_state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.sales_report(&query).await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/invoices/working-months",
    tag = "Reports",
    params(ReportQuery),
    responses((status = 200, description = "Meses com vendas", body = ActiveMonths)),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn working_months(
    State(app_state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let months = app_state.report_service.working_months(&query).await?;
    Ok(Json(months))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura", body = Invoice),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = app_state.invoice_service.get(id).await?;
    Ok(Json(invoice))
}

// ---
// Escrita
// ---

#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoicePayload,
    responses(
        (status = 201, description = "Fatura criada e estoque baixado", body = Invoice),
        (status = 409, description = "Estoque insuficiente ou número duplicado")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invoice = app_state.invoice_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    request_body = UpdateInvoicePayload,
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura atualizada e estoque reconciliado", body = Invoice),
        (status = 409, description = "Fatura cancelada ou estoque insuficiente")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_invoice(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invoice = app_state.invoice_service.update(id, &payload).await?;
    Ok(Json(invoice))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/cancel",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura cancelada e estoque devolvido", body = Invoice),
        (status = 409, description = "Fatura já cancelada")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn cancel_invoice(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = app_state.invoice_service.cancel(id).await?;
    Ok(Json(invoice))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/paid",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura quitada", body = Invoice),
        (status = 409, description = "Fatura cancelada ou já paga")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn mark_invoice_paid(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = app_state.invoice_service.mark_paid(id).await?;
    Ok(Json(invoice))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/advance",
    tag = "Invoices",
    request_body = AdvancePaymentPayload,
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Adiantamento registrado", body = Invoice),
        (status = 400, description = "Valor inválido"),
        (status = 409, description = "Fatura cancelada ou já paga")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn add_advance_payment(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvancePaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = app_state
        .invoice_service
        .add_advance(id, payload.amount)
        .await?;
    Ok(Json(invoice))
}
