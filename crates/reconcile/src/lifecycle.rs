//! Lifecycle states of an association resource and the transitions between them
//!
//! The controller keeps no state between invocations. The state a resource
//! is in before an event is implied by the event itself: a create targets a
//! resource that does not exist yet, anything else targets one that does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Lifecycle event kinds, as named by the engine's `RequestType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Create,
    Update,
    Delete,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Create" => Ok(Self::Create),
            "Update" => Ok(Self::Update),
            "Delete" => Ok(Self::Delete),
            other => Err(Error::UnsupportedRequestType(other.to_string())),
        }
    }
}

/// State of one association resource instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Not created yet
    Uninitialized,
    /// Associations created, physical id minted
    Created,
    /// At least one update applied
    Updated,
    /// Associations removed
    Deleted,
}

impl LifecycleState {
    /// The state an event of `kind` starts from.
    ///
    /// With no stored state this is inferred from the event, so it always
    /// has an edge for `kind`. The rejected rows of
    /// [`LifecycleState::transition`] only matter to callers that track
    /// state themselves.
    pub fn before(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Create => Self::Uninitialized,
            RequestKind::Update | RequestKind::Delete => Self::Created,
        }
    }

    /// Apply an event, returning `None` when the table has no such edge
    pub fn transition(self, kind: RequestKind) -> Option<Self> {
        match (self, kind) {
            (Self::Uninitialized, RequestKind::Create) => Some(Self::Created),
            (Self::Created | Self::Updated, RequestKind::Update) => Some(Self::Updated),
            (Self::Uninitialized | Self::Created | Self::Updated, RequestKind::Delete) => {
                Some(Self::Deleted)
            }
            (Self::Created | Self::Updated | Self::Deleted, RequestKind::Create)
            | (Self::Uninitialized | Self::Deleted, RequestKind::Update)
            | (Self::Deleted, RequestKind::Delete) => None,
        }
    }

    /// Like [`LifecycleState::transition`] but as an error
    pub fn next(self, kind: RequestKind) -> Result<Self, Error> {
        self.transition(kind)
            .ok_or(Error::InvalidTransition { from: self, kind })
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}
