//! A catalog of the actions, resource types and condition keys each AWS
//! service exposes to IAM policies, with ARN rendering for every resource
//! type.

pub mod aws;
pub mod catalog;
pub mod config;
pub mod iam;

pub use aws::{ArnTemplate, Placeholders, ARN};
pub use catalog::{CatalogError, Registry, ServiceCatalogEntry};
pub use config::CatalogConfig;
pub use iam::{AccessLevel, Action};
