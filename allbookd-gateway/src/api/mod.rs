//! HTTP API handlers for allbookd-gateway

pub mod bestsellers;
pub mod catalog;
pub mod health;

pub use bestsellers::{bestseller_routes, get_bestsellers};
pub use catalog::{catalog_routes, get_book, search_books};
pub use health::health_routes;
