//! Category record

use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::api::Resource;
use crate::domain::value_objects::EntityId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "categoryID", default, skip_serializing_if = "EntityId::is_new")]
    pub category_id: EntityId,
    #[validate(length(min = 1, max = 50, message = "Category name is required (max 50 characters)"))]
    pub category_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set by the backend when no product references the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removable: Option<bool>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self { category_name: name.into(), ..Default::default() }
    }

    pub fn is_removable(&self) -> bool { self.removable.unwrap_or(true) }
}

impl Resource for Category {
    const PATH: &'static str = "categories";
    const LABEL: &'static str = "Category";
    fn id(&self) -> EntityId { self.category_id }
}
