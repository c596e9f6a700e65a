//! # catalog
//!
//! Pure Rust client for the Service Catalog service-action association API.
//!
//! This crate provides:
//! - Typed identifiers for actions, products and provisioning artifacts
//! - The association tuple the bulk API consumes
//! - The [`CatalogClient`] trait with a production backend, a dry-run
//!   wrapper and an in-memory [`MockCatalog`]
//! - SigV4 request signing for the production backend
//!
//! ## Example
//!
//! ```
//! use catalog::{AssociationTuple, CatalogClient, MockCatalog};
//!
//! let catalog = MockCatalog::new();
//! let tuple = AssociationTuple::new("act-1".into(), "prod-1".into(), "pa-1".into());
//!
//! catalog.batch_associate(&[tuple.clone()]).unwrap();
//! assert_eq!(catalog.associations(), vec![tuple]);
//! ```
//!
//! ## Idempotence
//!
//! Re-associating an existing tuple, or disassociating a missing one, is
//! reported by the catalog per tuple. Backends treat those reports as success
//! and fail the whole batch on any other per-tuple error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod signing;
pub mod types;

pub use backend::dry_run::{DryRunCatalog, PlannedBatch};
pub use backend::service_catalog::ServiceCatalogClient;
pub use backend::{CatalogClient, MockCatalog, RecordedCall};
pub use error::{Error, ErrorCategory, Result};
pub use signing::Credentials;
pub use types::{
    ActionId, ArtifactId, ArtifactSet, AssociationTuple, BatchOperation, FailedAssociation,
    MAX_BATCH_SIZE, ProductId,
};
