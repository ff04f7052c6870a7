//! Value Objects for the admin console

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned numeric identifier. `0` marks a record that has not been created yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    pub const NEW: EntityId = EntityId(0);

    pub fn new(value: i64) -> Self { Self(value) }
    pub fn value(&self) -> i64 { self.0 }
    pub fn is_new(&self) -> bool { self.0 == 0 }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self { Self(value) }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub const MAX_LEN: usize = 50;

    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

/// One page request as the paging control reports it: zero-based index plus size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32) -> Self { Self { page_index, page_size: page_size.max(1) } }

    /// One-based page number sent as `pageNumber`.
    pub fn page_number(&self) -> u32 { self.page_index + 1 }
}

impl Default for PageRequest { fn default() -> Self { Self::new(0, 10) } }

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_sku() { let sku = Sku::new(" prod-001 ").unwrap(); assert_eq!(sku.as_str(), "PROD-001"); }
    #[test]
    fn test_sku_rejects_blank_and_long() {
        assert_eq!(Sku::new("  "), Err(SkuError::Empty));
        assert_eq!(Sku::new("X".repeat(51)), Err(SkuError::TooLong));
    }
    #[test]
    fn test_entity_id_new() {
        assert!(EntityId::NEW.is_new());
        assert!(!EntityId::new(42).is_new());
        assert_eq!(serde_json::to_string(&EntityId::new(42)).unwrap(), "42");
    }
    #[test]
    fn test_page_number_is_one_based() {
        assert_eq!(PageRequest::new(0, 5).page_number(), 1);
        assert_eq!(PageRequest::new(3, 0).page_size, 1);
    }
}
