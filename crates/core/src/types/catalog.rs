//! Catalog entities: categories, products, variants, attributes, reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, ReviewId};

/// A product category.
///
/// Categories carry the attribute definitions that products in them fill in
/// (e.g. "Fabric" for clothing, "Wattage" for appliances).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

impl Category {
    /// Look up an attribute definition by name (case-insensitive).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Input kind of a dynamic attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// One of a fixed option list.
    Select,
    /// A numeric value.
    Number,
    /// Free text.
    #[default]
    Text,
}

impl AttributeKind {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Number => "number",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttributeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Self::Select),
            "number" => Ok(Self::Number),
            "text" => Ok(Self::Text),
            other => Err(format!("invalid attribute type: {other}")),
        }
    }
}

/// A category-defined dynamic field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AttributeKind,
    /// Allowed values; only meaningful for [`AttributeKind::Select`].
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

/// A size option with its own stock count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub size: String,
    pub stock: u32,
}

/// A filled-in attribute on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    pub value: String,
}

/// A customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: ReviewId,
    #[serde(default)]
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A product as served by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    #[serde(default)]
    pub average_rating: Option<f32>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Product {
    /// Whether the product is sold in sizes.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Find a variant by size label.
    #[must_use]
    pub fn variant(&self, size: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.size == size)
    }

    /// Units available, for a given size when the product has variants.
    ///
    /// Returns 0 when a size is required but missing or unknown.
    #[must_use]
    pub fn available(&self, size: Option<&str>) -> u32 {
        if self.has_variants() {
            size.and_then(|s| self.variant(s)).map_or(0, |v| v.stock)
        } else {
            self.stock
        }
    }

    /// Whether any unit can be bought.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        if self.has_variants() {
            self.variants.iter().any(|v| v.stock > 0)
        } else {
            self.stock > 0
        }
    }

    /// First image URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Value of an attribute by name (case-insensitive).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shirt() -> Product {
        serde_json::from_value(json!({
            "_id": "p1",
            "name": "Linen Shirt",
            "price": 1299,
            "stock": 7,
            "variants": [{"size": "M", "stock": 3}, {"size": "L", "stock": 4}],
            "attributes": [{"name": "Fabric", "value": "Linen"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_product_decodes_with_mongo_style_id() {
        let product = shirt();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.price, Decimal::new(1299, 0));
        assert!(product.images.is_empty());
        assert!(product.reviews.is_empty());
    }

    #[test]
    fn test_available_requires_size_for_variant_products() {
        let product = shirt();
        assert_eq!(product.available(None), 0);
        assert_eq!(product.available(Some("L")), 4);
        assert_eq!(product.available(Some("XXL")), 0);
    }

    #[test]
    fn test_available_without_variants_uses_stock() {
        let mut product = shirt();
        product.variants.clear();
        assert_eq!(product.available(None), 7);
        assert!(product.in_stock());
    }

    #[test]
    fn test_attribute_lookup_is_case_insensitive() {
        assert_eq!(shirt().attribute("fabric"), Some("Linen"));
    }

    #[test]
    fn test_attribute_definition_type_field() {
        let def: AttributeDefinition = serde_json::from_value(json!({
            "name": "Colour",
            "type": "select",
            "options": ["Red", "Blue"],
            "required": true
        }))
        .unwrap();
        assert_eq!(def.kind, AttributeKind::Select);
        assert_eq!(def.options.len(), 2);
    }

    #[test]
    fn test_attribute_kind_from_str() {
        assert_eq!("Number".parse::<AttributeKind>(), Ok(AttributeKind::Number));
        assert!("colour".parse::<AttributeKind>().is_err());
    }
}
