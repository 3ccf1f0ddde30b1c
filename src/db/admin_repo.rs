// src/db/admin_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::admin::{Admin, AdminRole, AdminWithHash},
};

const ADMIN_COLUMNS: &str =
    "a.id, a.first_name, a.last_name, a.email, a.username, a.role, a.is_verified, a.created_at, a.updated_at";

// Acesso às tabelas 'admins' e 'credentials'
#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins a WHERE a.id = $1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    // Busca o admin junto com o hash da senha (login)
    pub async fn find_with_hash_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminWithHash>, AppError> {
        let sql = format!(
            "SELECT {ADMIN_COLUMNS}, c.password_hash
             FROM admins a
             INNER JOIN credentials c ON c.admin_id = a.id
             WHERE a.username = $1"
        );
        let admin = sqlx::query_as::<_, AdminWithHash>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn list_all(&self) -> Result<Vec<Admin>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins a ORDER BY a.created_at ASC");
        let admins = sqlx::query_as::<_, Admin>(&sql).fetch_all(&self.pool).await?;
        Ok(admins)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    // Serializa registros concorrentes para que só um seja o "primeiro admin"
    pub async fn lock_registration<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('admins.register'))")
            .execute(executor)
            .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_admin<'e, E>(
        &self,
        executor: E,
        first_name: &str,
        last_name: &str,
        email: &str,
        username: &str,
        role: AdminRole,
        is_verified: bool,
    ) -> Result<Admin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (first_name, last_name, email, username, role, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, first_name, last_name, email, username, role, is_verified, created_at, updated_at
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(username)
        .bind(role)
        .bind(is_verified)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("username") {
                        return AppError::UsernameAlreadyExists;
                    }
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn create_credentials<'e, E>(
        &self,
        executor: E,
        admin_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO credentials (admin_id, password_hash) VALUES ($1, $2)")
            .bind(admin_id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        is_verified: bool,
        role: Option<AdminRole>,
    ) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins
            SET is_verified = $2, role = COALESCE($3, role), updated_at = NOW()
            WHERE id = $1
            RETURNING id, first_name, last_name, email, username, role, is_verified, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_verified)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }
}
