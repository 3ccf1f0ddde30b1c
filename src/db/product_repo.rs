// src/db/product_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{push_page, push_search, PageQuery},
    },
    models::product::{CreateProductPayload, Product, UpdateProductPayload},
};

const SEARCH_COLUMNS: &[&str] = &["name", "category"];

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("category", "category"),
    ("price", "price"),
    ("stock", "stock"),
    ("entireStock", "entire_stock"),
];

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn list_page(&self, query: &PageQuery) -> Result<(Vec<Product>, i64), AppError> {
        let pattern = query.search_pattern();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_search(&mut count, SEARCH_COLUMNS, pattern.as_deref());
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE TRUE");
        push_search(&mut select, SEARCH_COLUMNS, pattern.as_deref());
        push_page(&mut select, query.sort_column(SORT_FIELDS, "name"), query);
        let products = select
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok((products, total))
    }

    // Produtos com estoque, para o relatório mensal
    pub async fn list_in_stock(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock > 0 ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Trava as linhas (FOR UPDATE) em ordem de id, evitando deadlock
    /// entre faturas concorrentes que tocam os mesmos produtos.
    pub async fn lock_many<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn create(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, category, price, stock, entire_stock)
            VALUES ($1, $2, $3, $4, GREATEST($4, $5))
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.category.trim())
        .bind(payload.price)
        .bind(payload.stock)
        .bind(payload.entire_stock)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2,
                category = $3,
                price = $4,
                stock = COALESCE($5, stock),
                entire_stock = COALESCE($6, entire_stock),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(payload.category.trim())
        .bind(payload.price)
        .bind(payload.stock)
        .bind(payload.entire_stock)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::Conflict(
                            "Product is referenced by invoices and cannot be deleted".into(),
                        );
                    }
                }
                AppError::from(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Soma `delta` ao estoque disponível. Retorna `false` (sem alterar nada)
    /// quando o resultado ficaria negativo.
    pub async fn adjust_stock<'e, E>(&self, executor: E, id: Uuid, delta: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Entrada de mercadoria: move `stock` e `entire_stock` juntos.
    /// Registros antigos com entire_stock = 0 partem do estoque atual.
    pub async fn adjust_received<'e, E>(&self, executor: E, id: Uuid, delta: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2,
                entire_stock = CASE WHEN entire_stock = 0 THEN stock ELSE entire_stock END + $2,
                updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
