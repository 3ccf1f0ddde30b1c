// src/services/invoice_service.rs

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{
        invoice_repo::InvoiceDraft, CustomerRepository, InvoiceRepository, ProductRepository,
    },
    models::{
        invoice::{
            line_total, lines_total, CreateInvoicePayload, Invoice, InvoiceFilter, InvoiceRow,
            PricedLine, UpdateInvoicePayload,
        },
        product::{is_whole_cents, Product, MAX_AMOUNT},
    },
    services::{
        numbering::{check_document_number, next_document_number, INVOICE_PREFIX, INVOICE_SEED},
        payment::PaymentState,
        stock::{quantities, sales_adjustments},
    },
};

/// Resolve as linhas contra os produtos travados: nome e (se ausente)
/// preço vêm do catálogo.
pub(crate) fn price_lines<I>(lines: I, products: &HashMap<Uuid, Product>) -> Result<Vec<PricedLine>, AppError>
where
    I: IntoIterator<Item = (Uuid, i32, Option<Decimal>)>,
{
    lines
        .into_iter()
        .map(|(product_id, quantity, price)| {
            let product = products
                .get(&product_id)
                .ok_or(AppError::ProductNotFound(product_id))?;
            let price = price.unwrap_or(product.price);
            if price.is_sign_negative() {
                return Err(AppError::BadRequest("Item price cannot be negative".into()));
            }
            if !is_whole_cents(&price) {
                return Err(AppError::BadRequest(
                    "Item price must have at most two decimal places".into(),
                ));
            }
            let total = line_total(quantity, price);
            if total > MAX_AMOUNT {
                return Err(AppError::BadRequest(format!("Line total for '{}' is too large", product.name)));
            }
            Ok(PricedLine {
                product_id,
                name: product.name.clone(),
                quantity,
                price,
                total,
            })
        })
        .collect()
}

/// Total do documento; precisa caber na coluna de dinheiro.
pub(crate) fn document_total(lines: &[PricedLine]) -> Result<Decimal, AppError> {
    let total = lines_total(lines);
    if total > MAX_AMOUNT {
        return Err(AppError::BadRequest("Document total is too large".into()));
    }
    Ok(total)
}

/// Confere, antes de gravar, que nenhum delta leva o estoque abaixo de zero.
pub(crate) fn check_stock(
    deltas: &BTreeMap<Uuid, i32>,
    products: &HashMap<Uuid, Product>,
) -> Result<(), AppError> {
    for (product_id, delta) in deltas {
        let product = products
            .get(product_id)
            .ok_or(AppError::ProductNotFound(*product_id))?;
        match product.stock.checked_add(*delta) {
            Some(stock) if stock >= 0 => {}
            Some(_) => return Err(AppError::InsufficientStock(product.name.clone())),
            None => {
                return Err(AppError::BadRequest(format!(
                    "Stock for '{}' would exceed the supported range",
                    product.name
                )))
            }
        }
    }
    Ok(())
}

fn by_id(products: Vec<Product>) -> HashMap<Uuid, Product> {
    products.into_iter().map(|p| (p.id, p)).collect()
}

fn payment_state(row: &InvoiceRow) -> PaymentState {
    PaymentState {
        total: row.total,
        advance: row.advance,
        is_paid: row.is_paid,
        is_cancelled: row.is_cancelled,
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    repo: InvoiceRepository,
    product_repo: ProductRepository,
    customer_repo: CustomerRepository,
    pool: PgPool,
}

impl InvoiceService {
    pub fn new(
        repo: InvoiceRepository,
        product_repo: ProductRepository,
        customer_repo: CustomerRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            product_repo,
            customer_repo,
            pool,
        }
    }

    // ---
    // Leitura
    // ---

    pub async fn list_all(&self) -> Result<Vec<Invoice>, AppError> {
        self.repo.list_all().await
    }

    pub async fn list_page(
        &self,
        query: &PageQuery,
        filter: &InvoiceFilter,
    ) -> Result<Paginated<Invoice>, AppError> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(AppError::BadRequest("startDate must not be after endDate".into()));
            }
        }
        let (invoices, total) = self.repo.list_page(query, filter).await?;
        Ok(Paginated::new(invoices, total, query))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Invoice>, AppError> {
        self.repo.recent(limit).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Invoice"))
    }

    /// Prévia do próximo número (não reserva nada).
    pub async fn next_number(&self) -> Result<String, AppError> {
        let highest = self.repo.highest_number(&self.pool, INVOICE_PREFIX).await?;
        next_document_number(INVOICE_PREFIX, INVOICE_SEED, highest)
    }

    // ---
    // Escrita (sempre numa transação junto com o estoque)
    // ---

    async fn apply_stock(
        &self,
        conn: &mut PgConnection,
        deltas: &BTreeMap<Uuid, i32>,
        products: &HashMap<Uuid, Product>,
    ) -> Result<(), AppError> {
        check_stock(deltas, products)?;
        for (product_id, delta) in deltas {
            if !self.product_repo.adjust_stock(&mut *conn, *product_id, *delta).await? {
                let name = products
                    .get(product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| product_id.to_string());
                return Err(AppError::InsufficientStock(name));
            }
        }
        Ok(())
    }

    pub async fn create(&self, payload: &CreateInvoicePayload) -> Result<Invoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = self
            .customer_repo
            .find_by_id(&mut *tx, payload.customer_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;

        let wanted = quantities(payload.items.iter().map(|i| (i.product_id, i.quantity)))?;
        let ids: Vec<Uuid> = wanted.keys().copied().collect();
        let products = by_id(self.product_repo.lock_many(&mut *tx, &ids).await?);

        let lines = price_lines(
            payload.items.iter().map(|i| (i.product_id, i.quantity, i.price)),
            &products,
        )?;
        let total = document_total(&lines)?;
        if payload.advance > total {
            return Err(AppError::BadRequest("Advance cannot exceed the invoice total".into()));
        }
        let is_paid = payload.is_paid || (total > Decimal::ZERO && payload.advance >= total);

        let deltas = sales_adjustments(&BTreeMap::new(), &wanted);
        self.apply_stock(&mut *tx, &deltas, &products).await?;

        let invoice_number = match payload
            .invoice_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            Some(number) => {
                check_document_number(INVOICE_PREFIX, number)?;
                number.to_string()
            }
            None => {
                self.repo.lock_numbering(&mut *tx).await?;
                let highest = self.repo.highest_number(&mut *tx, INVOICE_PREFIX).await?;
                next_document_number(INVOICE_PREFIX, INVOICE_SEED, highest)?
            }
        };

        let draft = InvoiceDraft {
            invoice_number: &invoice_number,
            date: payload.date,
            customer: &customer,
            is_paid,
            advance: payload.advance,
            total,
            notes: payload.notes.trim(),
        };
        let row = self.repo.insert(&mut *tx, &draft).await?;
        let items = self.repo.insert_items(&mut *tx, row.id, &lines).await?;

        tx.commit().await?;

        tracing::info!(
            "🧾 Invoice {} created for '{}' (total {}, {} lines)",
            row.invoice_number,
            row.customer_name,
            row.total,
            items.len()
        );
        Ok(Invoice::from_parts(row, items))
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateInvoicePayload) -> Result<Invoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = self
            .repo
            .lock_row(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Invoice"))?;
        if row.is_cancelled {
            return Err(AppError::InvoiceCancelled);
        }

        let old_items = self.repo.items_for(&mut *tx, &[id]).await?;
        let before = quantities(old_items.iter().map(|i| (i.product_id, i.quantity)))?;
        let after = quantities(payload.items.iter().map(|i| (i.product_id, i.quantity)))?;

        let customer = self
            .customer_repo
            .find_by_id(&mut *tx, payload.customer_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;
        let refresh_customer = customer.id != row.customer_id;

        let mut ids: Vec<Uuid> = before.keys().chain(after.keys()).copied().collect();
        ids.sort();
        ids.dedup();
        let products = by_id(self.product_repo.lock_many(&mut *tx, &ids).await?);

        let lines = price_lines(
            payload.items.iter().map(|i| (i.product_id, i.quantity, i.price)),
            &products,
        )?;
        let total = document_total(&lines)?;
        if row.advance > total {
            return Err(AppError::BadRequest(
                "Recorded advance exceeds the new invoice total".into(),
            ));
        }

        let deltas = sales_adjustments(&before, &after);
        self.apply_stock(&mut *tx, &deltas, &products).await?;

        let draft = InvoiceDraft {
            invoice_number: &row.invoice_number,
            date: payload.date,
            customer: &customer,
            is_paid: payload.is_paid.unwrap_or(row.is_paid),
            advance: row.advance,
            total,
            notes: payload.notes.trim(),
        };
        self.repo.delete_items(&mut *tx, id).await?;
        let items = self.repo.insert_items(&mut *tx, id, &lines).await?;
        let updated = self
            .repo
            .update_header(&mut *tx, id, &draft, refresh_customer)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Invoice {} updated ({} stock adjustments)",
            updated.invoice_number,
            deltas.len()
        );
        Ok(Invoice::from_parts(updated, items))
    }

    /// Cancela e devolve o estoque. Cancelar de novo é recusado.
    pub async fn cancel(&self, id: Uuid) -> Result<Invoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = self
            .repo
            .lock_row(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Invoice"))?;
        if row.is_cancelled {
            return Err(AppError::InvoiceCancelled);
        }

        let items = self.repo.items_for(&mut *tx, &[id]).await?;
        let sold = quantities(items.iter().map(|i| (i.product_id, i.quantity)))?;
        let ids: Vec<Uuid> = sold.keys().copied().collect();
        let products = by_id(self.product_repo.lock_many(&mut *tx, &ids).await?);

        let deltas = sales_adjustments(&sold, &BTreeMap::new());
        self.apply_stock(&mut *tx, &deltas, &products).await?;

        let cancelled = self.repo.mark_cancelled(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("❌ Invoice {} cancelled, stock restored", cancelled.invoice_number);
        Ok(Invoice::from_parts(cancelled, items))
    }

    pub async fn mark_paid(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.change_payment(id, |state| state.mark_paid()).await
    }

    pub async fn add_advance(&self, id: Uuid, amount: Decimal) -> Result<Invoice, AppError> {
        self.change_payment(id, |state| state.apply_advance(amount)).await
    }

    async fn change_payment<F>(&self, id: Uuid, change: F) -> Result<Invoice, AppError>
    where
        F: FnOnce(PaymentState) -> Result<PaymentState, AppError>,
    {
        let mut tx = self.pool.begin().await?;

        let row = self
            .repo
            .lock_row(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Invoice"))?;
        let next = change(payment_state(&row))?;

        let updated = self
            .repo
            .set_payment(&mut *tx, id, next.advance, next.is_paid)
            .await?;
        let items = self.repo.items_for(&mut *tx, &[id]).await?;
        tx.commit().await?;

        if next.is_paid && !row.is_paid {
            tracing::info!("💰 Invoice {} is now paid", updated.invoice_number);
        }
        Ok(Invoice::from_parts(updated, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(name: &str, price: &str, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            category: "250g".into(),
            price: price.parse().unwrap(),
            stock,
            entire_stock: stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn lines_snapshot_catalog_name_and_price() {
        let p = product("Dust 2", "450.00", 10);
        let id = p.id;
        let products = by_id(vec![p]);

        let lines = price_lines(
            [(id, 2, None), (id, 1, Some("400".parse().unwrap()))],
            &products,
        )
        .unwrap();

        assert_eq!(lines[0].name, "Dust 2");
        assert_eq!(lines[0].total, "900.00".parse::<Decimal>().unwrap());
        assert_eq!(lines[1].price, "400".parse::<Decimal>().unwrap());
        assert_eq!(lines_total(&lines), "1300.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn unknown_product_is_not_found() {
        let missing = Uuid::new_v4();
        let result = price_lines([(missing, 1, None)], &HashMap::new());
        assert!(matches!(result, Err(AppError::ProductNotFound(id)) if id == missing));
    }

    #[test]
    fn negative_price_is_rejected() {
        let p = product("BOPF", "10", 5);
        let id = p.id;
        let result = price_lines([(id, 1, Some("-1".parse().unwrap()))], &by_id(vec![p]));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn stock_check_names_the_short_product() {
        let p = product("Pekoe", "10", 3);
        let id = p.id;
        let products = by_id(vec![p]);

        let ok = BTreeMap::from([(id, -3)]);
        assert!(check_stock(&ok, &products).is_ok());

        let short = BTreeMap::from([(id, -4)]);
        assert!(matches!(
            check_stock(&short, &products),
            Err(AppError::InsufficientStock(name)) if name == "Pekoe"
        ));
    }

    #[test]
    fn stock_check_refuses_deltas_past_the_integer_range() {
        let p = product("Pekoe", "10", i32::MAX - 5);
        let id = p.id;
        let products = by_id(vec![p]);

        let up = BTreeMap::from([(id, 10)]);
        assert!(matches!(check_stock(&up, &products), Err(AppError::BadRequest(_))));
        assert!(check_stock(&BTreeMap::from([(id, 5)]), &products).is_ok());
    }

    #[test]
    fn repeated_huge_lines_are_refused_before_touching_stock() {
        let p = product("Dust 2", "1", 100);
        let id = p.id;
        let lines = [(id, 1_500_000_000), (id, 1_500_000_000)];

        assert!(matches!(quantities(lines), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn sub_cent_prices_never_reach_the_totals() {
        let p = product("BOPF", "10", 5);
        let id = p.id;
        let products = by_id(vec![p]);

        let result = price_lines(
            [(id, 1, Some("0.005".parse().unwrap())), (id, 1, Some("0.005".parse().unwrap()))],
            &products,
        );
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let lines = price_lines(
            [(id, 1, Some("0.01".parse().unwrap())), (id, 1, Some("0.01".parse().unwrap()))],
            &products,
        )
        .unwrap();
        let item_sum: Decimal = lines.iter().map(|l| l.total).sum();
        assert_eq!(document_total(&lines).unwrap(), item_sum);
    }

    #[test]
    fn oversized_totals_are_rejected() {
        let p = product("Bulk", "99999999999.99", 5);
        let id = p.id;
        let products = by_id(vec![p]);

        assert!(matches!(price_lines([(id, 100, None)], &products), Err(AppError::BadRequest(_))));

        let lines = price_lines([(id, 9, None), (id, 9, None)], &products).unwrap();
        assert!(matches!(document_total(&lines), Err(AppError::BadRequest(_))));
    }
}
