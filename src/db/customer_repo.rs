// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{push_page, push_search, PageQuery},
    },
    models::customer::{Customer, CustomerPayload, CustomerSummary},
};

const SEARCH_COLUMNS: &[&str] = &["name", "email", "phone", "address", "epf_number"];

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("email", "email"),
    ("createdAt", "created_at"),
];

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

fn map_unique(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            let field = if constraint.contains("phone") {
                "phone number"
            } else if constraint.contains("email") {
                "e-mail"
            } else if constraint.contains("epf") {
                "EPF number"
            } else {
                "value"
            };
            return AppError::Conflict(format!("A customer with this {field} already exists"));
        }
    }
    e.into()
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn list_page(&self, query: &PageQuery) -> Result<(Vec<Customer>, i64), AppError> {
        let pattern = query.search_pattern();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers WHERE TRUE");
        push_search(&mut count, SEARCH_COLUMNS, pattern.as_deref());
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM customers WHERE TRUE");
        push_search(&mut select, SEARCH_COLUMNS, pattern.as_deref());
        push_page(&mut select, query.sort_column(SORT_FIELDS, "name"), query);
        let customers = select
            .build_query_as::<Customer>()
            .fetch_all(&self.pool)
            .await?;

        Ok((customers, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        self.find_by_id(&self.pool, id).await
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn create(&self, payload: &CustomerPayload) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, address, phone, email, epf_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.address)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(&payload.epf_number)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)
    }

    pub async fn update(&self, id: Uuid, payload: &CustomerPayload) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, address = $3, phone = $4, email = $5, epf_number = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.address)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(&payload.epf_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique)
    }

    /// Retorna `false` se o cliente não existia.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::Conflict(
                            "Customer still has invoices and cannot be deleted".into(),
                        );
                    }
                }
                AppError::from(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    // Faturas canceladas não contam
    pub async fn summary(&self, id: Uuid) -> Result<CustomerSummary, AppError> {
        let summary = sqlx::query_as::<_, CustomerSummary>(
            r#"
            SELECT
                COUNT(*)::BIGINT AS invoice_count,
                COALESCE(SUM(total), 0) AS total_spent,
                COALESCE(SUM(CASE WHEN is_paid THEN total ELSE advance END), 0) AS total_paid,
                COALESCE(SUM(CASE WHEN is_paid THEN 0 ELSE total - advance END), 0) AS outstanding,
                MAX(date) AS last_purchase_date
            FROM invoices
            WHERE customer_id = $1 AND NOT is_cancelled
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}
