// src/services/product_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::ProductRepository,
    models::product::{CreateProductPayload, Product, UpdateProductPayload},
};

#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
}

impl ProductService {
    pub fn new(repo: ProductRepository) -> Self {
        Self { repo }
    }

    pub async fn list_all(&self) -> Result<Vec<Product>, AppError> {
        self.repo.list_all().await
    }

    pub async fn list_page(&self, query: &PageQuery) -> Result<Paginated<Product>, AppError> {
        let (products, total) = self.repo.list_page(query).await?;
        Ok(Paginated::new(products, total, query))
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::ProductNotFound(id))
    }

    pub async fn create(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        let product = self.repo.create(payload).await?;
        tracing::info!(
            "📦 Product '{}' created with {} units in stock",
            product.name,
            product.stock
        );
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Product, AppError> {
        let product = self
            .repo
            .update(id, payload)
            .await?
            .ok_or(AppError::ProductNotFound(id))?;

        if product.stock > product.entire_stock {
            tracing::warn!(
                "Product {} has stock ({}) above entire stock ({})",
                product.id,
                product.stock,
                product.entire_stock
            );
        }
        Ok(product)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::ProductNotFound(id));
        }
        tracing::info!("Product {} deleted", id);
        Ok(())
    }
}
