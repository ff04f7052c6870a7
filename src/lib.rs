//! Shop Admin Console
//!
//! Administrative console for a self-hosted e-commerce backend.
//!
//! ## Features
//! - Customer, product and category management
//! - Order management with line items
//! - Server-side pagination
//! - Role-gated routes backed by an external identity provider
//!
//! The console talks to the backend REST API through [`api::ApiClient`];
//! screens in [`views`] hold the state a front end renders.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod views;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::AdminConfig;
pub use domain::{Category, Customer, EntityId, Order, OrderDetail, OrderDraft, PageRequest, Product};

// =============================================================================
// Core Types
// =============================================================================

/// One page of a server-paginated list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(alias = "customers", alias = "products", alias = "categories", alias = "orders")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

impl<T> Default for Page<T> {
    fn default() -> Self { Self { total_count: 0, items: Vec::new() } }
}

/// `{id, name}` pair used by pickers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<rust_decimal::Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusOption {
    pub id: EntityId,
    pub name: String,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum AdminError {
    /// Caught before submission; never reaches the network.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Business-rule rejection reported by the backend.
    #[error("{0}")]
    Rejected(String),

    #[error("Request failed with status {status}")]
    Status { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdminError {
    /// Text for the error toast. Backend rejections and validation messages are shown
    /// verbatim; anything else falls back to the caller's message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected(message) if !message.trim().is_empty() => message.clone(),
            Self::Validation(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }
}

impl From<domain::DraftError> for AdminError {
    fn from(e: domain::DraftError) -> Self { AdminError::Validation(e.to_string()) }
}

impl From<validator::ValidationErrors> for AdminError {
    fn from(e: validator::ValidationErrors) -> Self { AdminError::Validation(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accepts_resource_named_items() {
        let page: Page<Category> = serde_json::from_str(r#"{"totalCount":12,"categories":[{"categoryID":1,"categoryName":"A"}]}"#).unwrap();
        assert_eq!(page.total_count, 12);
        assert_eq!(page.items.len(), 1);

        let page: Page<Category> = serde_json::from_str(r#"{"totalCount":0,"items":[]}"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_user_message() {
        assert_eq!(AdminError::Rejected("Email already used".into()).user_message("Failed"), "Email already used");
        assert_eq!(AdminError::Rejected("  ".into()).user_message("Failed"), "Failed");
        assert_eq!(AdminError::Status { status: 500 }.user_message("Failed to add customer"), "Failed to add customer");
        assert!(AdminError::from(domain::DraftError::NoItems).is_validation());
    }
}
