//! Product drafts as edited in the admin console.
//!
//! A draft is the body of `POST /admin/products` and
//! `PUT /admin/products/{id}`. It is validated locally before any request is
//! sent; a draft that fails validation never reaches the backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AttributeKind, Category, CategoryId, Product, ProductAttribute, Variant};

/// One reason a draft cannot be saved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Name is required")]
    EmptyName,

    #[error("Price must be a number")]
    InvalidPrice,

    #[error("Price cannot be negative")]
    NegativePrice,

    #[error("Stock must be a whole number")]
    InvalidStock,

    #[error("Every variant needs a size")]
    EmptyVariantSize,

    #[error("Stock for size {0} must be a whole number")]
    InvalidVariantStock(String),

    #[error("Size {0} is listed more than once")]
    DuplicateVariantSize(String),

    #[error("Variant stock adds up to {variant_total} but product stock is {declared}")]
    VariantStockMismatch { declared: u32, variant_total: u64 },

    #[error("{0} is required")]
    MissingAttribute(String),

    #[error("{name} must be a number, got \"{value}\"")]
    NotANumber { name: String, value: String },

    #[error("{value} is not an allowed value for {name}")]
    InvalidOption { name: String, value: String },

    #[error("{0} is not defined for this category")]
    UnknownAttribute(String),
}

/// Editable product fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            category_id: product.category_id.clone(),
            images: product.images.clone(),
            variants: product.variants.clone(),
            attributes: product.attributes.clone(),
        }
    }
}

impl ProductDraft {
    /// Sum of all variant stock counts.
    #[must_use]
    pub fn variant_stock_total(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.stock)).sum()
    }

    /// Value entered for an attribute, ignoring blank entries.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.trim())
            .filter(|v| !v.is_empty())
    }

    /// Check the draft, collecting every problem found.
    ///
    /// `category` is the category the product is filed under; when present
    /// its attribute definitions are enforced.
    ///
    /// # Errors
    ///
    /// Returns all [`DraftError`]s in field order.
    pub fn validate(&self, category: Option<&Category>) -> Result<(), Vec<DraftError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(DraftError::EmptyName);
        }
        if self.price < Decimal::ZERO {
            errors.push(DraftError::NegativePrice);
        }

        self.validate_variants(&mut errors);

        if let Some(category) = category {
            self.validate_attributes(category, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_variants(&self, errors: &mut Vec<DraftError>) {
        if self.variants.is_empty() {
            return;
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.variants.len());
        for variant in &self.variants {
            let size = variant.size.trim();
            if size.is_empty() {
                errors.push(DraftError::EmptyVariantSize);
            } else if seen.iter().any(|s| s.eq_ignore_ascii_case(size)) {
                errors.push(DraftError::DuplicateVariantSize(size.to_string()));
            } else {
                seen.push(size);
            }
        }

        let variant_total = self.variant_stock_total();
        if variant_total != u64::from(self.stock) {
            errors.push(DraftError::VariantStockMismatch {
                declared: self.stock,
                variant_total,
            });
        }
    }

    fn validate_attributes(&self, category: &Category, errors: &mut Vec<DraftError>) {
        for def in &category.attributes {
            let Some(value) = self.attribute(&def.name) else {
                if def.required {
                    errors.push(DraftError::MissingAttribute(def.name.clone()));
                }
                continue;
            };

            match def.kind {
                AttributeKind::Number => {
                    if value.parse::<Decimal>().is_err() {
                        errors.push(DraftError::NotANumber {
                            name: def.name.clone(),
                            value: value.to_string(),
                        });
                    }
                }
                AttributeKind::Select => {
                    if !def.options.iter().any(|o| o == value) {
                        errors.push(DraftError::InvalidOption {
                            name: def.name.clone(),
                            value: value.to_string(),
                        });
                    }
                }
                AttributeKind::Text => {}
            }
        }

        for attr in &self.attributes {
            if !attr.value.trim().is_empty() && category.attribute(&attr.name).is_none() {
                errors.push(DraftError::UnknownAttribute(attr.name.clone()));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::AttributeDefinition;

    fn variant(size: &str, stock: u32) -> Variant {
        Variant {
            size: size.to_string(),
            stock,
        }
    }

    fn attr(name: &str, value: &str) -> ProductAttribute {
        ProductAttribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Linen Shirt".to_string(),
            price: Decimal::new(129_900, 2),
            stock: 10,
            ..ProductDraft::default()
        }
    }

    fn clothing() -> Category {
        Category {
            id: CategoryId::new("c1"),
            name: "Clothing".to_string(),
            description: None,
            attributes: vec![
                AttributeDefinition {
                    name: "Fabric".to_string(),
                    kind: AttributeKind::Select,
                    options: vec!["Cotton".to_string(), "Linen".to_string()],
                    required: true,
                },
                AttributeDefinition {
                    name: "Weight".to_string(),
                    kind: AttributeKind::Number,
                    options: vec![],
                    required: false,
                },
                AttributeDefinition {
                    name: "Care".to_string(),
                    kind: AttributeKind::Text,
                    options: vec![],
                    required: false,
                },
            ],
        }
    }

    #[test]
    fn test_plain_draft_is_valid() {
        assert!(draft().validate(None).is_ok());
    }

    #[test]
    fn test_name_and_price_checked() {
        let d = ProductDraft {
            name: "   ".to_string(),
            price: Decimal::new(-1, 2),
            ..draft()
        };
        assert_eq!(
            d.validate(None).unwrap_err(),
            vec![DraftError::EmptyName, DraftError::NegativePrice]
        );
    }

    #[test]
    fn test_zero_price_allowed() {
        let d = ProductDraft {
            price: Decimal::ZERO,
            ..draft()
        };
        assert!(d.validate(None).is_ok());
    }

    #[test]
    fn test_variant_stock_must_equal_declared_stock() {
        let d = ProductDraft {
            variants: vec![variant("S", 3), variant("M", 4)],
            ..draft()
        };
        assert_eq!(
            d.validate(None).unwrap_err(),
            vec![DraftError::VariantStockMismatch {
                declared: 10,
                variant_total: 7
            }]
        );

        let d = ProductDraft {
            variants: vec![variant("S", 3), variant("M", 7)],
            ..draft()
        };
        assert!(d.validate(None).is_ok());
    }

    #[test]
    fn test_variant_sizes_must_be_present_and_distinct() {
        let d = ProductDraft {
            variants: vec![variant("M", 5), variant(" ", 0), variant("m", 5)],
            ..draft()
        };
        assert_eq!(
            d.validate(None).unwrap_err(),
            vec![
                DraftError::EmptyVariantSize,
                DraftError::DuplicateVariantSize("m".to_string())
            ]
        );
    }

    #[test]
    fn test_category_attributes_enforced() {
        let d = ProductDraft {
            attributes: vec![attr("Weight", "heavy"), attr("Colour", "Red")],
            ..draft()
        };
        assert_eq!(
            d.validate(Some(&clothing())).unwrap_err(),
            vec![
                DraftError::MissingAttribute("Fabric".to_string()),
                DraftError::NotANumber {
                    name: "Weight".to_string(),
                    value: "heavy".to_string()
                },
                DraftError::UnknownAttribute("Colour".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_value_must_be_an_option() {
        let d = ProductDraft {
            attributes: vec![attr("Fabric", "Silk")],
            ..draft()
        };
        assert_eq!(
            d.validate(Some(&clothing())).unwrap_err(),
            vec![DraftError::InvalidOption {
                name: "Fabric".to_string(),
                value: "Silk".to_string()
            }]
        );
    }

    #[test]
    fn test_valid_attributes_pass() {
        let d = ProductDraft {
            attributes: vec![
                attr("Fabric", "Linen"),
                attr("Weight", "0.45"),
                attr("Care", "Hand wash"),
            ],
            ..draft()
        };
        assert!(d.validate(Some(&clothing())).is_ok());
    }

    #[test]
    fn test_blank_attribute_counts_as_missing() {
        let d = ProductDraft {
            attributes: vec![attr("Fabric", "  ")],
            ..draft()
        };
        assert_eq!(
            d.validate(Some(&clothing())).unwrap_err(),
            vec![DraftError::MissingAttribute("Fabric".to_string())]
        );
    }

    #[test]
    fn test_error_message_for_stock_mismatch() {
        let err = DraftError::VariantStockMismatch {
            declared: 10,
            variant_total: 7,
        };
        assert_eq!(
            err.to_string(),
            "Variant stock adds up to 7 but product stock is 10"
        );
    }
}
