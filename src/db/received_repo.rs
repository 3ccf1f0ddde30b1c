// src/db/received_repo.rs

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
        invoice::PricedLine,
        received::{ReceivedInvoice, ReceivedInvoiceRow, ReceivedItem},
    },
};

const SEARCH_COLUMNS: &[&str] = &["invoice_number", "supplier"];

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("date", "date"),
    ("invoiceNumber", "invoice_number"),
    ("supplier", "supplier"),
    ("total", "total"),
    ("createdAt", "created_at"),
];

pub struct ReceiptDraft<'a> {
    pub invoice_number: &'a str,
    pub date: NaiveDate,
    pub supplier: &'a str,
    pub notes: &'a str,
    pub total: Decimal,
}

#[derive(Clone)]
pub struct ReceivedInvoiceRepository {
    pool: PgPool,
}

impl ReceivedInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_items(&self, rows: Vec<ReceivedInvoiceRow>) -> Result<Vec<ReceivedInvoice>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = self.items_for(&self.pool, &ids).await?;
        Ok(ReceivedInvoice::assemble(rows, items))
    }

    pub async fn items_for<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<ReceivedItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let items = sqlx::query_as::<_, ReceivedItem>(
            r#"
            SELECT received_invoice_id, line_no, product_id, name, quantity, price, total
            FROM received_invoice_items
            WHERE received_invoice_id = ANY($1)
            ORDER BY received_invoice_id, line_no
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_all(&self) -> Result<Vec<ReceivedInvoice>, AppError> {
        let rows = sqlx::query_as::<_, ReceivedInvoiceRow>(
            "SELECT * FROM received_invoices ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        self.with_items(rows).await
    }

    pub async fn list_page(&self, query: &PageQuery) -> Result<(Vec<ReceivedInvoice>, i64), AppError> {
        let pattern = query.search_pattern();

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM received_invoices WHERE TRUE");
        push_search(&mut count, SEARCH_COLUMNS, pattern.as_deref());
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM received_invoices WHERE TRUE");
        push_search(&mut select, SEARCH_COLUMNS, pattern.as_deref());
        push_page(&mut select, query.sort_column(SORT_FIELDS, "date"), query);
        let rows = select
            .build_query_as::<ReceivedInvoiceRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((self.with_items(rows).await?, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReceivedInvoice>, AppError> {
        let row = sqlx::query_as::<_, ReceivedInvoiceRow>("SELECT * FROM received_invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn lock_row<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ReceivedInvoiceRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ReceivedInvoiceRow>(
            "SELECT * FROM received_invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn lock_numbering<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('received_invoices.number'))")
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn highest_number<'e, E>(&self, executor: E, prefix: &str) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = format!("^{prefix}-([0-9]{{1,18}})$");
        let highest = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(CAST(SUBSTRING(invoice_number FROM $1) AS BIGINT)) FROM received_invoices",
        )
        .bind(pattern)
        .fetch_one(executor)
        .await?;
        Ok(highest)
    }

    pub async fn insert<'e, E>(&self, executor: E, draft: &ReceiptDraft<'_>) -> Result<ReceivedInvoiceRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ReceivedInvoiceRow>(
            r#"
            INSERT INTO received_invoices (invoice_number, date, supplier, notes, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(draft.invoice_number)
        .bind(draft.date)
        .bind(draft.supplier)
        .bind(draft.notes)
        .bind(draft.total)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &ReceiptDraft<'_>,
    ) -> Result<ReceivedInvoiceRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ReceivedInvoiceRow>(
            r#"
            UPDATE received_invoices
            SET date = $2, supplier = $3, notes = $4, total = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.date)
        .bind(draft.supplier)
        .bind(draft.notes)
        .bind(draft.total)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn insert_items<'e, E>(
        &self,
        executor: E,
        receipt_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<Vec<ReceivedItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO received_invoice_items (received_invoice_id, line_no, product_id, name, quantity, price, total) ",
        );
        builder.push_values(lines.iter().enumerate(), |mut b, (i, line)| {
            b.push_bind(receipt_id)
                .push_bind(i as i32 + 1)
                .push_bind(line.product_id)
                .push_bind(line.name.clone())
                .push_bind(line.quantity)
                .push_bind(line.price)
                .push_bind(line.total);
        });
        builder.push(" RETURNING received_invoice_id, line_no, product_id, name, quantity, price, total");

        let items = builder
            .build_query_as::<ReceivedItem>()
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn delete_items<'e, E>(&self, executor: E, receipt_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM received_invoice_items WHERE received_invoice_id = $1")
            .bind(receipt_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
