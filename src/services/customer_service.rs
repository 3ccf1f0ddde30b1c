// src/services/customer_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{CustomerRepository, InvoiceRepository},
    models::{
        customer::{Customer, CustomerPayload, CustomerSummary},
        invoice::Invoice,
    },
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    invoice_repo: InvoiceRepository,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, invoice_repo: InvoiceRepository) -> Self {
        Self { repo, invoice_repo }
    }

    pub async fn list_all(&self) -> Result<Vec<Customer>, AppError> {
        self.repo.list_all().await
    }

    pub async fn list_page(&self, query: &PageQuery) -> Result<Paginated<Customer>, AppError> {
        let (customers, total) = self.repo.list_page(query).await?;
        Ok(Paginated::new(customers, total, query))
    }

    pub async fn get(&self, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find(id)
            .await?
            .ok_or(AppError::NotFound("Customer"))
    }

    pub async fn create(&self, payload: &CustomerPayload) -> Result<Customer, AppError> {
        let customer = self.repo.create(payload).await?;
        tracing::info!("Customer '{}' created ({})", customer.name, customer.id);
        Ok(customer)
    }

    pub async fn update(&self, id: Uuid, payload: &CustomerPayload) -> Result<Customer, AppError> {
        self.repo
            .update(id, payload)
            .await?
            .ok_or(AppError::NotFound("Customer"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Customer"));
        }
        tracing::info!("Customer {} deleted", id);
        Ok(())
    }

    pub async fn invoices(&self, id: Uuid) -> Result<Vec<Invoice>, AppError> {
        self.get(id).await?;
        self.invoice_repo.by_customer(id).await
    }

    pub async fn summary(&self, id: Uuid) -> Result<CustomerSummary, AppError> {
        self.get(id).await?;
        self.repo.summary(id).await
    }
}
