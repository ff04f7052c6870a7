//! Aggregates module
pub mod customer;
pub mod category;
pub mod product;
pub mod order;

pub use customer::Customer;
pub use category::Category;
pub use product::Product;
pub use order::{Order, OrderDetail, OrderDraft, DraftError};
