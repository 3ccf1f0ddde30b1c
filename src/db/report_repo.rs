// src/db/report_repo.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::report::{ActiveMonth, DashboardStats, DateWindow, SalesAggregateRow, TopSellingRow},
};

// Consultas de agregação (somente leitura)
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Vendas por produto na janela; canceladas nunca entram
    pub async fn sales_by_product(
        &self,
        window: DateWindow,
        include_unpaid: bool,
    ) -> Result<Vec<SalesAggregateRow>, AppError> {
        let rows = sqlx::query_as::<_, SalesAggregateRow>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                p.category,
                SUM(ii.quantity)::BIGINT AS total_quantity,
                COALESCE(SUM(ii.total), 0) AS total_revenue,
                COUNT(DISTINCT i.id)::BIGINT AS total_invoices
            FROM invoices i
            INNER JOIN invoice_items ii ON ii.invoice_id = i.id
            INNER JOIN products p ON p.id = ii.product_id
            WHERE NOT i.is_cancelled
              AND ($3 OR i.is_paid)
              AND i.date BETWEEN $1 AND $2
            GROUP BY p.id, p.name, p.category
            ORDER BY total_revenue DESC, p.name ASC
            "#,
        )
        .bind(window.start_date)
        .bind(window.end_date)
        .bind(include_unpaid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Uma fatura com vários produtos conta uma vez só
    pub async fn distinct_invoice_count(
        &self,
        window: DateWindow,
        include_unpaid: bool,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT i.id)::BIGINT
            FROM invoices i
            INNER JOIN invoice_items ii ON ii.invoice_id = i.id
            WHERE NOT i.is_cancelled
              AND ($3 OR i.is_paid)
              AND i.date BETWEEN $1 AND $2
            "#,
        )
        .bind(window.start_date)
        .bind(window.end_date)
        .bind(include_unpaid)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn top_selling(&self, limit: Option<i64>) -> Result<Vec<TopSellingRow>, AppError> {
        let rows = sqlx::query_as::<_, TopSellingRow>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                p.category,
                SUM(ii.quantity)::BIGINT AS total_quantity,
                COALESCE(SUM(ii.total), 0) AS total_revenue
            FROM invoices i
            INNER JOIN invoice_items ii ON ii.invoice_id = i.id
            INNER JOIN products p ON p.id = ii.product_id
            WHERE NOT i.is_cancelled
            GROUP BY p.id, p.name, p.category
            ORDER BY total_quantity DESC, p.name ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn active_months(
        &self,
        window: DateWindow,
        include_unpaid: bool,
    ) -> Result<Vec<ActiveMonth>, AppError> {
        let months = sqlx::query_as::<_, ActiveMonth>(
            r#"
            SELECT
                TO_CHAR(DATE_TRUNC('month', date), 'YYYY-MM') AS month,
                COUNT(*)::BIGINT AS invoice_count,
                COALESCE(SUM(total), 0) AS revenue
            FROM invoices
            WHERE NOT is_cancelled
              AND ($3 OR is_paid)
              AND date BETWEEN $1 AND $2
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(window.start_date)
        .bind(window.end_date)
        .bind(include_unpaid)
        .fetch_all(&self.pool)
        .await?;
        Ok(months)
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        // Snapshot consistente dos contadores
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total_customers = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&mut *tx)
            .await?;
        let total_products = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await?;
        let (total_invoices, total_revenue) = sqlx::query_as::<_, (i64, Decimal)>(
            "SELECT COUNT(*), COALESCE(SUM(total), 0) FROM invoices WHERE NOT is_cancelled",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardStats {
            total_customers,
            total_products,
            total_invoices,
            total_revenue,
        })
    }
}
