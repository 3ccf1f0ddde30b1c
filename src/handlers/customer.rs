// src/handlers/customer.rs

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
        customer::{Customer, CustomerPayload, CustomerSummary},
        invoice::Invoice,
    },
};

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses((status = 200, description = "Todos os clientes", body = [Customer])),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_customers(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.customer_service.list_all().await?;
    Ok(Json(customers))
}

#[utoipa::path(
    get,
    path = "/api/customers/paginated",
    tag = "Customers",
    params(PageQuery),
    responses((status = 200, description = "Página de clientes { data, pagination }")),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_customers_paginated(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.customer_service.list_page(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.get(id).await?;
    Ok(Json(customer))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/invoices",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Faturas do cliente", body = [Invoice])),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn customer_invoices(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoices = app_state.customer_service.invoices(id).await?;
    Ok(Json(invoices))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/summary",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Resumo financeiro do cliente", body = CustomerSummary)),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn customer_summary(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.customer_service.summary(id).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 409, description = "Telefone, e-mail ou EPF já cadastrado")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let customer = app_state.customer_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    request_body = CustomerPayload,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Cliente atualizado", body = Customer)),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let customer = app_state.customer_service.update(id, &payload).await?;
    Ok(Json(customer))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 409, description = "Cliente possui faturas")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.customer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
