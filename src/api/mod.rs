//! Backend REST API access.

pub mod client;
pub mod menu;
pub mod orders;
pub mod resource;

pub use client::ApiClient;
pub use menu::MenuService;
pub use orders::{AggregateSave, DetailFailure, OrderService};
pub use resource::{Resource, ResourceService};

use crate::{Category, Customer, Product};

pub type CustomerService = ResourceService<Customer>;
pub type ProductService = ResourceService<Product>;
pub type CategoryService = ResourceService<Category>;
