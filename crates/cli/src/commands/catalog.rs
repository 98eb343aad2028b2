//! Product and category commands.
//!
//! Listings use the same filters as the admin console tables.

use shopfront_core::listing::ListQuery;
use shopfront_core::{Category, CategoryId, Product, ProductId};

use super::{CliError, Context, confirm, print_table};

/// `shop-cli products list`
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub async fn list_products(
    ctx: &Context,
    q: Option<String>,
    category: Option<String>,
    stock: Option<String>,
) -> Result<(), CliError> {
    let query = ListQuery {
        q,
        category,
        stock,
        ..ListQuery::default()
    };
    let products = query
        .product_filter()
        .apply(ctx.client.list_products().await?);

    tracing::info!(count = products.len(), "Products matched");
    print_table(
        &["ID", "NAME", "PRICE", "STOCK", "SIZES"],
        &products.iter().map(product_row).collect::<Vec<_>>(),
    );
    Ok(())
}

fn product_row(product: &Product) -> Vec<String> {
    vec![
        product.id.to_string(),
        product.name.clone(),
        product.price.to_string(),
        product.stock.to_string(),
        product
            .variants
            .iter()
            .map(|v| format!("{}:{}", v.size, v.stock))
            .collect::<Vec<_>>()
            .join(","),
    ]
}

/// `shop-cli categories list`
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub async fn list_categories(ctx: &Context, q: Option<String>) -> Result<(), CliError> {
    let query = ListQuery {
        q,
        ..ListQuery::default()
    };
    let categories = query
        .category_filter()
        .apply(ctx.client.list_categories().await?);

    print_table(
        &["ID", "NAME", "ATTRIBUTES"],
        &categories.iter().map(category_row).collect::<Vec<_>>(),
    );
    Ok(())
}

fn category_row(category: &Category) -> Vec<String> {
    vec![
        category.id.to_string(),
        category.name.clone(),
        category
            .attributes
            .iter()
            .map(|a| {
                let marker = if a.required { "*" } else { "" };
                format!("{}{marker}:{}", a.name, a.kind)
            })
            .collect::<Vec<_>>()
            .join(","),
    ]
}

/// `shop-cli products delete`
///
/// # Errors
///
/// Returns an error if the deletion is not confirmed or the backend
/// refuses it.
pub async fn delete_product(ctx: &Context, id: &str, yes: bool) -> Result<(), CliError> {
    let id = ProductId::new(id);
    let product = ctx.client.get_product(&id).await?;
    confirm(&format!("Delete product '{}' ({id})?", product.name), yes)?;

    let token = ctx.admin_token().await?;
    ctx.client.delete_product(&token, &id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}

/// `shop-cli categories delete`
///
/// # Errors
///
/// Returns an error if the deletion is not confirmed or the backend
/// refuses it.
pub async fn delete_category(ctx: &Context, id: &str, yes: bool) -> Result<(), CliError> {
    let id = CategoryId::new(id);
    let category = ctx.client.get_category(&id).await?;
    confirm(&format!("Delete category '{}' ({id})?", category.name), yes)?;

    let token = ctx.admin_token().await?;
    ctx.client.delete_category(&token, &id).await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_row_lists_sizes() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1", "name": "Tee", "price": "12.50", "stock": 5,
            "variants": [{"size": "S", "stock": 2}, {"size": "M", "stock": 3}]
        }))
        .unwrap();
        assert_eq!(product_row(&product), vec!["p1", "Tee", "12.50", "5", "S:2,M:3"]);
    }

    #[test]
    fn test_category_row_marks_required() {
        let category: Category = serde_json::from_value(json!({
            "id": "c1", "name": "Clothing",
            "attributes": [
                {"name": "Fabric", "type": "select", "options": ["Cotton"], "required": true},
                {"name": "Weight", "type": "number"}
            ]
        }))
        .unwrap();
        assert_eq!(
            category_row(&category),
            vec!["c1", "Clothing", "Fabric*:select,Weight:number"]
        );
    }
}
