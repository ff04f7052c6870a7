//! Customer record

use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::api::Resource;
use crate::domain::value_objects::EntityId;

/// Phone and email uniqueness is enforced by the backend; a clash comes back as a rejection string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "customerID", default, skip_serializing_if = "EntityId::is_new")]
    pub customer_id: EntityId,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

impl Customer {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self { customer_id: EntityId::NEW, first_name: first_name.into(), last_name: last_name.into(), phone: phone.into(), email: email.into() }
    }

    pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name).trim().to_string() }
}

impl Resource for Customer {
    const PATH: &'static str = "customers";
    const LABEL: &'static str = "Customer";
    fn id(&self) -> EntityId { self.customer_id }
}
