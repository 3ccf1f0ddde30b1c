// src/handlers/admin.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{AuthenticatedAdmin, SESSION_COOKIE},
        rbac::RequireAdmin,
    },
    models::{
        admin::{
            Admin, FirstRunResponse, LoginAdminPayload, RegisterAdminPayload, SessionResponse,
            UpdateAdminStatusPayload,
        },
        report::DashboardStats,
    },
};

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .build()
}

#[utoipa::path(
    post,
    path = "/api/admin/register",
    tag = "Admin",
    request_body = RegisterAdminPayload,
    responses(
        (status = 201, description = "Admin registrado", body = Admin),
        (status = 409, description = "E-mail ou usuário já em uso")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterAdminPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let admin = app_state.auth_service.register_admin(&payload).await?;

    Ok((StatusCode::CREATED, Json(admin)))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "Admin",
    request_body = LoginAdminPayload,
    responses(
        (status = 200, description = "Sessão criada (cookie httpOnly)", body = SessionResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginAdminPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    let jar = jar.add(session_cookie(session.token, app_state.config.cookie_secure));
    Ok((
        jar,
        Json(SessionResponse {
            admin: session.admin,
            expires_at: session.expires_at,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    tag = "Admin",
    responses((status = 200, description = "Cookie de sessão removido"))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "success": true })))
}

#[utoipa::path(
    get,
    path = "/api/admin/first-run",
    tag = "Admin",
    responses((status = 200, description = "Verdadeiro quando ainda não há admins", body = FirstRunResponse))
)]
pub async fn first_run(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let first_run = app_state.auth_service.is_first_run().await?;
    Ok(Json(FirstRunResponse { first_run }))
}

#[utoipa::path(
    get,
    path = "/api/admin/me",
    tag = "Admin",
    responses(
        (status = 200, description = "Admin da sessão", body = Admin),
        (status = 401, description = "Sem sessão")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedAdmin(admin): AuthenticatedAdmin) -> Json<Admin> {
    Json(admin)
}

#[utoipa::path(
    get,
    path = "/api/admin/all",
    tag = "Admin",
    responses((status = 200, description = "Todos os admins", body = [Admin])),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_admins(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let admins = app_state.auth_service.list_admins().await?;
    Ok(Json(admins))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses((status = 200, description = "Indicadores do painel", body = DashboardStats)),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn stats(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.report_service.dashboard_stats().await?;
    Ok(Json(stats))
}

#[utoipa::path(
    post,
    path = "/api/admin/{id}/verify",
    tag = "Admin",
    request_body = UpdateAdminStatusPayload,
    params(("id" = Uuid, Path, description = "ID do admin")),
    responses(
        (status = 200, description = "Status atualizado", body = Admin),
        (status = 403, description = "Requer papel admin"),
        (status = 404, description = "Admin não encontrado")
    ),
    security(("session_cookie" = []), ("api_jwt" = []))
)]
pub async fn verify_admin(
    State(app_state): State<AppState>,
    AuthenticatedAdmin(actor): AuthenticatedAdmin,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdminStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let admin = app_state
        .auth_service
        .update_status(&actor, id, &payload)
        .await?;

    tracing::info!(
        "Admin '{}' set '{}' to verified={} role={}",
        actor.username,
        admin.username,
        admin.is_verified,
        admin.role.as_str()
    );
    Ok(Json(admin))
}
