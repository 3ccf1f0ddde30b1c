// src/handlers/report.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::RequireAdmin,
    models::report::EmailReportResponse,
};

#[utoipa::path(
    post,
    path = "/api/reports/email",
    tag = "Reports",
    responses(
        (status = 200, description = "Relatório mensal enviado", body = EmailReportResponse),
        (status = 503, description = "SMTP não configurado")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn send_email_report(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    let sent = app_state.report_service.send_monthly_report().await?;
    Ok(Json(sent))
}
