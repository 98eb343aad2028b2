//! Catalog endpoints: products, categories and reviews.

use reqwest::Method;
use serde::Serialize;
use shopfront_core::{AccessToken, Category, CategoryId, Product, ProductId};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{BackendClient, BackendError, segment};

#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    rating: u8,
    comment: &'a str,
}

impl BackendClient {
    /// All products (`GET /products`), cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .fetch(self.request(Method::GET, "products", None)?)
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// One product with its reviews (`GET /products/{id}`), cached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("products/{}", segment(id.as_str()));
        let product: Product = self.fetch(self.request(Method::GET, &path, None)?).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// All categories (`GET /categories`), cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for category list");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .fetch(self.request(Method::GET, "categories", None)?)
            .await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// One category with its attribute definitions (`GET /categories/{id}`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or an error if the request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: &CategoryId) -> Result<Category, BackendError> {
        let path = format!("categories/{}", segment(id.as_str()));
        self.fetch(self.request(Method::GET, &path, None)?).await
    }

    /// Post a review (`POST /products/{id}/reviews`).
    ///
    /// Drops the cached product so the new review shows on the next view.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the review.
    #[instrument(skip(self, token, comment), fields(product_id = %id))]
    pub async fn submit_review(
        &self,
        token: &AccessToken,
        id: &ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<(), BackendError> {
        let path = format!("products/{}/reviews", segment(id.as_str()));
        let builder = self
            .request(Method::POST, &path, Some(token))?
            .json(&ReviewRequest { rating, comment });
        self.send(builder).await?;

        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
        Ok(())
    }
}
