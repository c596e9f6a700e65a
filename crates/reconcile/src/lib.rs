//! # Reconcile
//!
//! Lifecycle reconciliation for service-action association resources.
//!
//! An infrastructure engine sends Create, Update and Delete events for a
//! resource that ties one service action to the provisioning artifacts of
//! one product. This crate parses those events, resolves which artifacts
//! are meant, and converges the catalog with at most one batch call.
//!
//! ## Core Concepts
//!
//! - **LifecycleEvent**: a parsed request, see [`event`]
//! - **ArtifactResolver**: declared or discovered artifact sets
//! - **DiffEngine**: grow-only comparison of artifact snapshots
//! - **LifecycleController**: turns one request into one [`Transition`]
//!
//! ## Example
//!
//! ```ignore
//! use catalog::MockCatalog;
//! use reconcile::{DeclaredArtifacts, LifecycleController, LifecycleEvent};
//!
//! let event = LifecycleEvent::from_json(&json)?;
//! let controller = LifecycleController::new(MockCatalog::new(), DeclaredArtifacts);
//! let transition = controller.handle(&event.request)?;
//! println!("{}", transition.physical_resource_id);
//! ```

pub mod association;
pub mod controller;
pub mod diff;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod resolver;
pub mod types;

pub use association::{AssociationBatch, AssociationSetBuilder, BatchOutcome};
pub use controller::{LifecycleController, Transition};
pub use diff::{ArtifactDiff, DiffEngine};
pub use error::{Error, ErrorKind, Result};
pub use event::{
    ARTIFACT_DELIMITER, CreateRequest, DeleteRequest, LifecycleEvent, LifecycleRequest,
    RawRequest, RequestContext, UpdateRequest,
};
pub use lifecycle::{LifecycleState, RequestKind};
pub use resolver::{ArtifactResolver, DeclaredArtifacts, DiscoveredArtifacts};
pub use types::{DesiredState, PHYSICAL_ID_PREFIX, PhysicalResourceId, StackIdentity};
