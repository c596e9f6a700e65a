//! Core types for service-action associations.
//!
//! This module contains the identifiers and value objects shared by the
//! client trait, its backends, and the reconciliation crate: the opaque
//! identifiers, the ordered artifact set, and the association tuple that
//! the bulk API consumes.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a service action (the capability being associated).
    ActionId
);

opaque_id!(
    /// Identifier of a product.
    ProductId
);

opaque_id!(
    /// Identifier of one provisioning artifact (an immutable product version).
    ArtifactId
);

/// Insertion-ordered set of artifact identifiers.
///
/// Duplicates collapse on insert. The order only makes output deterministic;
/// equality is set equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactSet(IndexSet<ArtifactId>);

impl ArtifactSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a delimited list such as `"v1|v2|v3"`.
    ///
    /// Segments are trimmed and empty segments are dropped, so `""` is the
    /// empty set.
    pub fn from_delimited(raw: &str, delimiter: char) -> Self {
        raw.split(delimiter)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(ArtifactId::from)
            .collect()
    }

    /// Add an artifact, returning `false` if it was already present.
    pub fn insert(&mut self, id: ArtifactId) -> bool {
        self.0.insert(id)
    }

    /// Number of distinct artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no artifacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set contains `id`.
    #[must_use]
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.0.contains(id)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactId> {
        self.0.iter()
    }

    /// Artifacts in `self` that are not in `other`, keeping `self`'s order.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.0.difference(&other.0).cloned().collect()
    }

    /// Render back to the delimited form.
    #[must_use]
    pub fn to_delimited(&self, delimiter: char) -> String {
        let mut out = String::new();
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(delimiter);
            }
            out.push_str(id.as_str());
        }
        out
    }
}

impl PartialEq for ArtifactSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|id| other.0.contains(id))
    }
}

impl Eq for ArtifactSet {}

impl FromIterator<ArtifactId> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = ArtifactId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a ArtifactId;
    type IntoIter = indexmap::set::Iter<'a, ArtifactId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ArtifactSet {
    type Item = ArtifactId;
    type IntoIter = indexmap::set::IntoIter<ArtifactId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ArtifactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.to_delimited(','))
    }
}

/// One edge of the action ↔ artifact association graph.
///
/// Serializes to the wire shape of the bulk association APIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationTuple {
    /// The associated service action.
    #[serde(rename = "ServiceActionId")]
    pub action_id: ActionId,
    /// The product owning the artifact.
    #[serde(rename = "ProductId")]
    pub product_id: ProductId,
    /// The product version.
    #[serde(rename = "ProvisioningArtifactId")]
    pub artifact_id: ArtifactId,
}

impl AssociationTuple {
    /// Create a tuple.
    pub fn new(action_id: ActionId, product_id: ProductId, artifact_id: ArtifactId) -> Self {
        Self {
            action_id,
            product_id,
            artifact_id,
        }
    }
}

impl fmt::Display for AssociationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}/{}",
            self.action_id, self.product_id, self.artifact_id
        )
    }
}

/// Most `ServiceActionAssociations` the catalog accepts in one batch request.
pub const MAX_BATCH_SIZE: usize = 50;

/// The two bulk operations the catalog exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    /// Attach the action to each artifact.
    Associate,
    /// Detach the action from each artifact.
    Disassociate,
}

impl BatchOperation {
    /// Wire name of the operation.
    #[must_use]
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Associate => "BatchAssociateServiceActionWithProvisioningArtifact",
            Self::Disassociate => "BatchDisassociateServiceActionFromProvisioningArtifact",
        }
    }

    /// Per-tuple error code that still means the tuple is in the requested state.
    ///
    /// Associating an existing edge reports `DUPLICATE_RESOURCE`; removing a
    /// missing one reports `RESOURCE_NOT_FOUND`. Both are idempotent no-ops.
    #[must_use]
    pub fn idempotent_error_code(&self) -> &'static str {
        match self {
            Self::Associate => "DUPLICATE_RESOURCE",
            Self::Disassociate => "RESOURCE_NOT_FOUND",
        }
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Associate => f.write_str("associate"),
            Self::Disassociate => f.write_str("disassociate"),
        }
    }
}

/// A tuple the catalog refused within an otherwise accepted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAssociation {
    /// The refused tuple.
    #[serde(flatten)]
    pub tuple: AssociationTuple,
    /// Catalog error code, e.g. `LIMIT_EXCEEDED`.
    #[serde(rename = "ErrorCode", default)]
    pub error_code: String,
    /// Human-readable reason.
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: String,
}

impl fmt::Display for FailedAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}: {})",
            self.tuple, self.error_code, self.error_message
        )
    }
}
