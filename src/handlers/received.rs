// src/handlers/received.rs

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
        invoice::NextNumberResponse,
        received::{ReceivedInvoice, ReceivedInvoicePayload},
    },
};

#[utoipa::path(
    get,
    path = "/api/received-invoices",
    tag = "Received Invoices",
    responses((status = 200, description = "Todas as notas de entrada", body = [ReceivedInvoice])),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_received(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let receipts = app_state.received_service.list_all().await?;
    Ok(Json(receipts))
}

#[utoipa::path(
    get,
    path = "/api/received-invoices/paginated",
    tag = "Received Invoices",
    params(PageQuery),
    responses((status = 200, description = "Página de notas de entrada { data, pagination }")),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_received_paginated(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.received_service.list_page(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/received-invoices/next-number",
    tag = "Received Invoices",
    responses((status = 200, description = "Próximo número de nota de entrada", body = NextNumberResponse)),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn next_received_number(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let next_number = app_state.received_service.next_number().await?;
    Ok(Json(NextNumberResponse { next_number }))
}

#[utoipa::path(
    get,
    path = "/api/received-invoices/{id}",
    tag = "Received Invoices",
    params(("id" = Uuid, Path, description = "ID da nota de entrada")),
    responses(
        (status = 200, description = "Nota de entrada", body = ReceivedInvoice),
        (status = 404, description = "Não encontrada")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_received(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = app_state.received_service.get(id).await?;
    Ok(Json(receipt))
}

#[utoipa::path(
    post,
    path = "/api/received-invoices",
    tag = "Received Invoices",
    request_body = ReceivedInvoicePayload,
    responses((status = 201, description = "Entrada registrada e estoque reposto", body = ReceivedInvoice)),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_received(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Json(payload): Json<ReceivedInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let receipt = app_state.received_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    put,
    path = "/api/received-invoices/{id}",
    tag = "Received Invoices",
    request_body = ReceivedInvoicePayload,
    params(("id" = Uuid, Path, description = "ID da nota de entrada")),
    responses(
        (status = 200, description = "Entrada atualizada e estoque reconciliado", body = ReceivedInvoice),
        (status = 409, description = "Reconciliação deixaria estoque negativo")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_received(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceivedInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let receipt = app_state.received_service.update(id, &payload).await?;
    Ok(Json(receipt))
}
