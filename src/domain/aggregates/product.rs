//! Product record

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::api::Resource;
use crate::domain::value_objects::{EntityId, Sku};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_product", skip_on_field_errors = false))]
pub struct Product {
    #[serde(rename = "productID", default, skip_serializing_if = "EntityId::is_new")]
    pub product_id: EntityId,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    #[serde(rename = "categoryID")]
    pub category_id: EntityId,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: u32,
    #[validate(length(min = 1, message = "UPC is required"))]
    pub upc: String,
    pub sku: String,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    pub fn new(name: impl Into<String>, category_id: EntityId, price: Decimal, sku: impl Into<String>, upc: impl Into<String>) -> Self {
        Self {
            product_id: EntityId::NEW, product_name: name.into(), category_id, price,
            stock_quantity: 0, upc: upc.into(), sku: sku.into(), image_url: None,
        }
    }

    pub fn is_in_stock(&self) -> bool { self.stock_quantity > 0 }
}

fn validate_product(p: &Product) -> Result<(), ValidationError> {
    if p.category_id.is_new() { return Err(ValidationError::new("category_required")); }
    if p.price.is_sign_negative() { return Err(ValidationError::new("negative_price")); }
    Sku::new(p.sku.as_str()).map_err(|_| ValidationError::new("invalid_sku"))?;
    Ok(())
}

impl Resource for Product {
    const PATH: &'static str = "products";
    const LABEL: &'static str = "Product";
    fn id(&self) -> EntityId { self.product_id }
}
