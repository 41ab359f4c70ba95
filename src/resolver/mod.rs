//! Target resolvers.

pub mod catalog;

pub use catalog::{CatalogConfig, CatalogResolver, ConsumerRecord, ErratumRecord, PackageRef};
