// src/services/received_service.rs

use std::collections::{BTreeMap, HashMap};

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{received_repo::ReceiptDraft, ProductRepository, ReceivedInvoiceRepository},
    models::{
        product::Product,
        received::{ReceivedInvoice, ReceivedInvoicePayload},
    },
    services::{
        invoice_service::{check_stock, document_total, price_lines},
        numbering::{check_document_number, next_document_number, RECEIPT_PREFIX, RECEIPT_SEED},
        stock::{quantities, receipt_adjustments},
    },
};

#[derive(Clone)]
pub struct ReceivedInvoiceService {
    repo: ReceivedInvoiceRepository,
    product_repo: ProductRepository,
    pool: PgPool,
}

impl ReceivedInvoiceService {
    pub fn new(repo: ReceivedInvoiceRepository, product_repo: ProductRepository, pool: PgPool) -> Self {
        Self {
            repo,
            product_repo,
            pool,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<ReceivedInvoice>, AppError> {
        self.repo.list_all().await
    }

    pub async fn list_page(&self, query: &PageQuery) -> Result<Paginated<ReceivedInvoice>, AppError> {
        let (receipts, total) = self.repo.list_page(query).await?;
        Ok(Paginated::new(receipts, total, query))
    }

    pub async fn get(&self, id: Uuid) -> Result<ReceivedInvoice, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Received invoice"))
    }

    pub async fn next_number(&self) -> Result<String, AppError> {
        let highest = self.repo.highest_number(&self.pool, RECEIPT_PREFIX).await?;
        next_document_number(RECEIPT_PREFIX, RECEIPT_SEED, highest)
    }

    async fn apply_received(
        &self,
        conn: &mut PgConnection,
        deltas: &BTreeMap<Uuid, i32>,
        products: &HashMap<Uuid, Product>,
    ) -> Result<(), AppError> {
        check_stock(deltas, products)?;
        for (product_id, delta) in deltas {
            if !self
                .product_repo
                .adjust_received(&mut *conn, *product_id, *delta)
                .await?
            {
                let name = products
                    .get(product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| product_id.to_string());
                return Err(AppError::InsufficientStock(name));
            }
        }
        Ok(())
    }

    pub async fn create(&self, payload: &ReceivedInvoicePayload) -> Result<ReceivedInvoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let received = quantities(payload.items.iter().map(|i| (i.product_id, i.quantity)))?;
        let ids: Vec<Uuid> = received.keys().copied().collect();
        let products: HashMap<Uuid, Product> = self
            .product_repo
            .lock_many(&mut *tx, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let lines = price_lines(
            payload.items.iter().map(|i| (i.product_id, i.quantity, Some(i.price))),
            &products,
        )?;

        let total = document_total(&lines)?;

        let deltas = receipt_adjustments(&BTreeMap::new(), &received);
        self.apply_received(&mut *tx, &deltas, &products).await?;

        let invoice_number = match payload
            .invoice_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            Some(number) => {
                check_document_number(RECEIPT_PREFIX, number)?;
                number.to_string()
            }
            None => {
                self.repo.lock_numbering(&mut *tx).await?;
                let highest = self.repo.highest_number(&mut *tx, RECEIPT_PREFIX).await?;
                next_document_number(RECEIPT_PREFIX, RECEIPT_SEED, highest)?
            }
        };

        let draft = ReceiptDraft {
            invoice_number: &invoice_number,
            date: payload.date,
            supplier: payload.supplier.trim(),
            notes: payload.notes.trim(),
            total,
        };
        let row = self.repo.insert(&mut *tx, &draft).await?;
        let items = self.repo.insert_items(&mut *tx, row.id, &lines).await?;

        tx.commit().await?;

        tracing::info!(
            "🚚 Received invoice {} from '{}' recorded ({} products restocked)",
            row.invoice_number,
            row.supplier,
            deltas.len()
        );
        Ok(ReceivedInvoice::from_parts(row, items))
    }

    pub async fn update(&self, id: Uuid, payload: &ReceivedInvoicePayload) -> Result<ReceivedInvoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = self
            .repo
            .lock_row(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Received invoice"))?;

        let old_items = self.repo.items_for(&mut *tx, &[id]).await?;
        let before = quantities(old_items.iter().map(|i| (i.product_id, i.quantity)))?;
        let after = quantities(payload.items.iter().map(|i| (i.product_id, i.quantity)))?;

        let mut ids: Vec<Uuid> = before.keys().chain(after.keys()).copied().collect();
        ids.sort();
        ids.dedup();
        let products: HashMap<Uuid, Product> = self
            .product_repo
            .lock_many(&mut *tx, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let lines = price_lines(
            payload.items.iter().map(|i| (i.product_id, i.quantity, Some(i.price))),
            &products,
        )?;

        let total = document_total(&lines)?;

        let deltas = receipt_adjustments(&before, &after);
        self.apply_received(&mut *tx, &deltas, &products).await?;

        let draft = ReceiptDraft {
            invoice_number: &row.invoice_number,
            date: payload.date,
            supplier: payload.supplier.trim(),
            notes: payload.notes.trim(),
            total,
        };
        self.repo.delete_items(&mut *tx, id).await?;
        let items = self.repo.insert_items(&mut *tx, id, &lines).await?;
        let updated = self.repo.update_header(&mut *tx, id, &draft).await?;

        tx.commit().await?;

        tracing::info!("Received invoice {} updated", updated.invoice_number);
        Ok(ReceivedInvoice::from_parts(updated, items))
    }
}
