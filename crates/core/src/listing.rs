//! In-process filtering and pagination of fetched lists.
//!
//! The backend returns whole collections; narrowing them down for a page is
//! done here with plain predicates.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{Category, CategoryId, Product, User, UserRole};

/// Products per page on the storefront.
pub const STOREFRONT_PAGE_SIZE: usize = 12;

/// Rows per page in admin tables.
pub const ADMIN_PAGE_SIZE: usize = 20;

/// One page of a larger list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped into range.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Cut `page` (1-based) out of `items`.
    ///
    /// Out-of-range pages are clamped, so page 0 is page 1 and a page past
    /// the end is the last page. An empty list has one empty page.
    #[must_use]
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);

        let items = items
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn prev_page(&self) -> usize {
        self.page.saturating_sub(1)
    }

    #[must_use]
    pub const fn next_page(&self) -> usize {
        self.page + 1
    }

    /// Keep the paging figures, transform the rows.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Stock state filter for admin product tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFilter {
    InStock,
    OutOfStock,
}

impl std::str::FromStr for StockFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(Self::InStock),
            "out_of_stock" => Ok(Self::OutOfStock),
            other => Err(format!("invalid stock filter: {other}")),
        }
    }
}

/// Raw list query string as submitted by filter forms.
///
/// Every field arrives as text (possibly empty) and is interpreted by the
/// `*_filter` methods; unparseable values are ignored rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub attribute: Option<String>,
    pub value: Option<String>,
    pub stock: Option<String>,
    pub role: Option<String>,
    pub page: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl ListQuery {
    /// Requested page, defaulting to 1.
    #[must_use]
    pub fn page(&self) -> usize {
        non_blank(self.page.as_ref())
            .and_then(|p| p.parse().ok())
            .unwrap_or(1)
    }

    /// Search text, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        non_blank(self.q.as_ref())
    }

    #[must_use]
    pub fn product_filter(&self) -> ProductFilter {
        let attribute = non_blank(self.attribute.as_ref()).and_then(|name| {
            non_blank(self.value.as_ref()).map(|value| (name.to_string(), value.to_string()))
        });

        ProductFilter {
            search: self.search().map(str::to_lowercase),
            category: non_blank(self.category.as_ref()).map(CategoryId::new),
            min_price: non_blank(self.min_price.as_ref()).and_then(|p| p.parse().ok()),
            max_price: non_blank(self.max_price.as_ref()).and_then(|p| p.parse().ok()),
            attribute,
            stock: non_blank(self.stock.as_ref()).and_then(|s| s.parse().ok()),
        }
    }

    #[must_use]
    pub fn user_filter(&self) -> UserFilter {
        UserFilter {
            search: self.search().map(str::to_lowercase),
            role: non_blank(self.role.as_ref()).and_then(|r| r.parse().ok()),
        }
    }

    #[must_use]
    pub fn category_filter(&self) -> CategoryFilter {
        CategoryFilter {
            search: self.search().map(str::to_lowercase),
        }
    }
}

/// Product predicates; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Lowercased; matched against name and description.
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Attribute name and exact value, compared case-insensitively.
    pub attribute: Option<(String, String)>,
    pub stock: Option<StockFilter>,
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(needle) = &self.search {
            let hit = product.name.to_lowercase().contains(needle.as_str())
                || product.description.to_lowercase().contains(needle.as_str());
            if !hit {
                return false;
            }
        }
        if self
            .category
            .as_ref()
            .is_some_and(|category| product.category_id.as_ref() != Some(category))
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some((name, value)) = &self.attribute {
            let hit = product
                .attribute(name)
                .is_some_and(|v| v.eq_ignore_ascii_case(value));
            if !hit {
                return false;
            }
        }
        match self.stock {
            Some(StockFilter::InStock) => product.in_stock(),
            Some(StockFilter::OutOfStock) => !product.in_stock(),
            None => true,
        }
    }

    /// Keep the matching products, preserving order.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }

    /// Whether any predicate is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}

/// User predicates for the admin user table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Lowercased; matched against name and email.
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

impl UserFilter {
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        if let Some(needle) = &self.search {
            let hit = user.name.to_lowercase().contains(needle.as_str())
                || user.email.as_str().contains(needle.as_str());
            if !hit {
                return false;
            }
        }
        self.role.is_none_or(|role| user.role == role)
    }

    #[must_use]
    pub fn apply(&self, users: Vec<User>) -> Vec<User> {
        users.into_iter().filter(|u| self.matches(u)).collect()
    }
}

/// Category predicates for the admin category table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub search: Option<String>,
}

impl CategoryFilter {
    #[must_use]
    pub fn matches(&self, category: &Category) -> bool {
        self.search
            .as_ref()
            .is_none_or(|needle| category.name.to_lowercase().contains(needle.as_str()))
    }

    #[must_use]
    pub fn apply(&self, categories: Vec<Category>) -> Vec<Category> {
        categories.into_iter().filter(|c| self.matches(c)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn products() -> Vec<Product> {
        serde_json::from_value(json!([
            {"id": "p1", "name": "Linen Shirt", "price": "1299", "category_id": "c1", "stock": 4,
             "attributes": [{"name": "Fabric", "value": "Linen"}]},
            {"id": "p2", "name": "Cotton Tee", "description": "soft everyday shirt", "price": "499",
             "category_id": "c1", "stock": 0, "attributes": [{"name": "Fabric", "value": "Cotton"}]},
            {"id": "p3", "name": "Desk Lamp", "price": "2499", "category_id": "c2", "stock": 9}
        ]))
        .unwrap()
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let value: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(value)).unwrap()
    }

    #[test]
    fn test_paginate_clamps_page() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 3, 12);
        assert_eq!(page.items, vec![25]);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev());
        assert!(!page.has_next());

        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 0, 12);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 12);

        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 99, 12);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_empty_list_has_one_empty_page() {
        let page: Page<u8> = Page::paginate(Vec::new(), 5, 20);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let page = Page::paginate((1..=40).collect::<Vec<_>>(), 2, 20);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.first(), Some(&21));
        assert!(!page.has_next());
    }

    #[test]
    fn test_search_matches_name_or_description() {
        let filter = query(&[("q", "SHIRT")]).product_filter();
        assert_eq!(ids(&filter.apply(products())), vec!["p1", "p2"]);
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let filter = query(&[("min_price", "499"), ("max_price", "1299")]).product_filter();
        assert_eq!(ids(&filter.apply(products())), vec!["p1", "p2"]);
    }

    #[test]
    fn test_category_and_attribute() {
        let filter = query(&[("category", "c1"), ("attribute", "fabric"), ("value", "cotton")])
            .product_filter();
        assert_eq!(ids(&filter.apply(products())), vec!["p2"]);
    }

    #[test]
    fn test_attribute_without_value_is_ignored() {
        let filter = query(&[("attribute", "Fabric"), ("value", "")]).product_filter();
        assert!(filter.attribute.is_none());
        assert!(!filter.is_active());
    }

    #[test]
    fn test_stock_filter() {
        let filter = query(&[("stock", "out_of_stock")]).product_filter();
        assert_eq!(ids(&filter.apply(products())), vec!["p2"]);
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let q = query(&[("min_price", "cheap"), ("page", "two"), ("stock", "maybe")]);
        assert_eq!(q.product_filter(), ProductFilter::default());
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn test_user_filter_by_role_and_email() {
        let users: Vec<User> = serde_json::from_value(json!([
            {"id": "u1", "name": "Asha", "email": "asha@example.com", "role": "admin"},
            {"id": "u2", "name": "Ben", "email": "ben@shop.test"}
        ]))
        .unwrap();

        let admins = query(&[("role", "admin")]).user_filter().apply(users.clone());
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].id.as_str(), "u1");

        let by_mail = query(&[("q", "shop.test")]).user_filter().apply(users);
        assert_eq!(by_mail.len(), 1);
        assert_eq!(by_mail[0].name, "Ben");
    }

    #[test]
    fn test_category_filter() {
        let categories: Vec<Category> = serde_json::from_value(json!([
            {"id": "c1", "name": "Clothing"},
            {"id": "c2", "name": "Lighting"}
        ]))
        .unwrap();
        let hits = query(&[("q", "light")]).category_filter().apply(categories);
        assert_eq!(hits.len(), 1);
    }
}
