//! Catalog reads and admin catalog writes.

use reqwest::Method;
use serde::Serialize;
use shopfront_core::product_draft::ProductDraft;
use shopfront_core::{AccessToken, AttributeDefinition, Category, CategoryId, Product, ProductId};
use tracing::instrument;

use super::{BackendClient, BackendError, segment};

/// Body of `POST /admin/categories` and `PUT /admin/categories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub attributes: Vec<AttributeDefinition>,
}

impl BackendClient {
    /// All products (`GET /products`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        self.fetch(self.request(Method::GET, "products", None)?)
            .await
    }

    /// One product (`GET /products/{id}`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let path = format!("products/{}", segment(id.as_str()));
        self.fetch(self.request(Method::GET, &path, None)?).await
    }

    /// All categories (`GET /categories`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        self.fetch(self.request(Method::GET, "categories", None)?)
            .await
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

    // =========================================================================
    // Products
    // =========================================================================

    /// `POST /admin/products`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        token: &AccessToken,
        draft: &ProductDraft,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "admin/products", Some(token))?
            .json(draft);
        self.send(builder).await
    }

    /// `PUT /admin/products/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), BackendError> {
        let path = format!("admin/products/{}", segment(id.as_str()));
        let builder = self.request(Method::PUT, &path, Some(token))?.json(draft);
        self.send(builder).await
    }

    /// `DELETE /admin/products/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        let path = format!("admin/products/{}", segment(id.as_str()));
        self.send(self.request(Method::DELETE, &path, Some(token))?)
            .await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// `POST /admin/categories`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the category.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        token: &AccessToken,
        input: &CategoryInput,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "admin/categories", Some(token))?
            .json(input);
        self.send(builder).await
    }

    /// `PUT /admin/categories/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        token: &AccessToken,
        id: &CategoryId,
        input: &CategoryInput,
    ) -> Result<(), BackendError> {
        let path = format!("admin/categories/{}", segment(id.as_str()));
        let builder = self.request(Method::PUT, &path, Some(token))?.json(input);
        self.send(builder).await
    }

    /// `DELETE /admin/categories/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        token: &AccessToken,
        id: &CategoryId,
    ) -> Result<(), BackendError> {
        let path = format!("admin/categories/{}", segment(id.as_str()));
        self.send(self.request(Method::DELETE, &path, Some(token))?)
            .await
    }
}
