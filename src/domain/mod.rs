//! Console domain: backend records and the order aggregate.

pub mod aggregates;
pub mod value_objects;

pub use aggregates::*;
pub use value_objects::{EntityId, PageRequest, Sku, SkuError};
