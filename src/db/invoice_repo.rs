// src/db/invoice_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{push_page, push_search, PageQuery},
    },
    models::{
        customer::Customer,
        invoice::{Invoice, InvoiceFilter, InvoiceItem, InvoiceRow, PricedLine, StatusFilter},
    },
};

const SEARCH_COLUMNS: &[&str] = &["invoice_number", "customer_name"];

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("date", "date"),
    ("invoiceNumber", "invoice_number"),
    ("total", "total"),
    ("customerName", "customer_name"),
    ("createdAt", "created_at"),
];

// Cabeçalho a gravar (criação e atualização)
pub struct InvoiceDraft<'a> {
    pub invoice_number: &'a str,
    pub date: NaiveDate,
    pub customer: &'a Customer,
    pub is_paid: bool,
    pub advance: Decimal,
    pub total: Decimal,
    pub notes: &'a str,
}

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &InvoiceFilter) {
    match filter.status_filter.unwrap_or_default() {
        StatusFilter::All => {}
        StatusFilter::Paid => {
            builder.push(" AND is_paid AND NOT is_cancelled");
        }
        StatusFilter::Unpaid => {
            builder.push(" AND NOT is_paid AND NOT is_cancelled");
        }
        StatusFilter::Cancelled => {
            builder.push(" AND is_cancelled");
        }
    }
    if let Some(start) = filter.start_date {
        builder.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND date <= ").push_bind(end);
    }
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    async fn with_items(&self, rows: Vec<InvoiceRow>) -> Result<Vec<Invoice>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = self.items_for(&self.pool, &ids).await?;
        Ok(Invoice::assemble(rows, items))
    }

    pub async fn items_for<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<InvoiceItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT invoice_id, line_no, product_id, name, quantity, price, total
            FROM invoice_items
            WHERE invoice_id = ANY($1)
            ORDER BY invoice_id, line_no
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_all(&self) -> Result<Vec<Invoice>, AppError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            "SELECT * FROM invoices ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        self.with_items(rows).await
    }

    pub async fn list_page(
        &self,
        query: &PageQuery,
        filter: &InvoiceFilter,
    ) -> Result<(Vec<Invoice>, i64), AppError> {
        let pattern = query.search_pattern();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM invoices WHERE TRUE");
        push_search(&mut count, SEARCH_COLUMNS, pattern.as_deref());
        push_filter(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM invoices WHERE TRUE");
        push_search(&mut select, SEARCH_COLUMNS, pattern.as_deref());
        push_filter(&mut select, filter);
        push_page(&mut select, query.sort_column(SORT_FIELDS, "date"), query);
        let rows = select
            .build_query_as::<InvoiceRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((self.with_items(rows).await?, total))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Invoice>, AppError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            "SELECT * FROM invoices ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        self.with_items(rows).await
    }

    pub async fn by_customer(&self, customer_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            "SELECT * FROM invoices WHERE customer_id = $1 ORDER BY date DESC, created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        self.with_items(rows).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let row = sqlx::query_as::<_, InvoiceRow>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    // Trava a fatura até o fim da transação
    pub async fn lock_row<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<InvoiceRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InvoiceRow>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    // ---
    // Numeração
    // ---

    pub async fn lock_numbering<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('invoices.number'))")
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Maior sufixo numérico entre os números `PREFIX-NNNNN` existentes.
    /// Sufixos com mais de 18 dígitos não cabem em BIGINT e são ignorados.
    pub async fn highest_number<'e, E>(&self, executor: E, prefix: &str) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = format!("^{prefix}-([0-9]{{1,18}})$");
        let highest = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(CAST(SUBSTRING(invoice_number FROM $1) AS BIGINT)) FROM invoices",
        )
        .bind(pattern)
        .fetch_one(executor)
        .await?;
        Ok(highest)
    }

    // ---
    // Escrita
    // ---

    pub async fn insert<'e, E>(&self, executor: E, draft: &InvoiceDraft<'_>) -> Result<InvoiceRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InvoiceRow>(
            r#"
            INSERT INTO invoices (
                invoice_number, date, customer_id,
                customer_name, customer_address, customer_phone, customer_email, epf_number,
                is_paid, advance, total, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(draft.invoice_number)
        .bind(draft.date)
        .bind(draft.customer.id)
        .bind(&draft.customer.name)
        .bind(&draft.customer.address)
        .bind(&draft.customer.phone)
        .bind(&draft.customer.email)
        .bind(&draft.customer.epf_number)
        .bind(draft.is_paid)
        .bind(draft.advance)
        .bind(draft.total)
        .bind(draft.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "Invoice number {} already exists",
                        draft.invoice_number
                    ));
                }
            }
            e.into()
        })
    }

    /// Sobrescreve o cabeçalho. O snapshot do cliente só é renovado quando
    /// `refresh_customer` é verdadeiro (troca de cliente).
    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &InvoiceDraft<'_>,
        refresh_customer: bool,
    ) -> Result<InvoiceRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            UPDATE invoices SET
                date = $2,
                customer_id = $3,
                customer_name = CASE WHEN $4 THEN $5 ELSE customer_name END,
                customer_address = CASE WHEN $4 THEN $6 ELSE customer_address END,
                customer_phone = CASE WHEN $4 THEN $7 ELSE customer_phone END,
                customer_email = CASE WHEN $4 THEN $8 ELSE customer_email END,
                epf_number = CASE WHEN $4 THEN $9 ELSE epf_number END,
                is_paid = $10,
                advance = $11,
                total = $12,
                notes = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.date)
        .bind(draft.customer.id)
        .bind(refresh_customer)
        .bind(&draft.customer.name)
        .bind(&draft.customer.address)
        .bind(&draft.customer.phone)
        .bind(&draft.customer.email)
        .bind(&draft.customer.epf_number)
        .bind(draft.is_paid)
        .bind(draft.advance)
        .bind(draft.total)
        .bind(draft.notes)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn insert_items<'e, E>(
        &self,
        executor: E,
        invoice_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<Vec<InvoiceItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO invoice_items (invoice_id, line_no, product_id, name, quantity, price, total) ",
        );
        builder.push_values(lines.iter().enumerate(), |mut b, (i, line)| {
            b.push_bind(invoice_id)
                .push_bind(i as i32 + 1)
                .push_bind(line.product_id)
                .push_bind(line.name.clone())
                .push_bind(line.quantity)
                .push_bind(line.price)
                .push_bind(line.total);
        });
        builder.push(" RETURNING invoice_id, line_no, product_id, name, quantity, price, total");

        let items = builder
            .build_query_as::<InvoiceItem>()
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn delete_items<'e, E>(&self, executor: E, invoice_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn mark_cancelled<'e, E>(&self, executor: E, id: Uuid) -> Result<InvoiceRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InvoiceRow>(
            "UPDATE invoices SET is_cancelled = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn set_payment<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        advance: Decimal,
        is_paid: bool,
    ) -> Result<InvoiceRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            UPDATE invoices SET advance = $2, is_paid = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(advance)
        .bind(is_paid)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }
}
