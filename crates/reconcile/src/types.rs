//! Core types for association reconciliation

use crate::error::{Error, Result};
use catalog::{ActionId, ArtifactSet, ProductId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of every minted physical resource id.
pub const PHYSICAL_ID_PREFIX: &str = "ass-";

/// Number of random hex characters after the prefix.
const PHYSICAL_ID_RANDOM_LEN: usize = 13;

/// Declared properties of the association resource at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub action_id: ActionId,
    pub product_id: ProductId,
    /// Caller-managed artifact list; `None` when the property is absent
    pub declared: Option<ArtifactSet>,
}

impl DesiredState {
    pub fn new(action_id: ActionId, product_id: ProductId, declared: Option<ArtifactSet>) -> Self {
        Self {
            action_id,
            product_id,
            declared,
        }
    }

    /// Name of the first identity property that differs from `previous`.
    ///
    /// The action and product identify a resource instance, so a change to
    /// either means the instance is being replaced rather than updated.
    pub fn identity_change(&self, previous: &DesiredState) -> Option<&'static str> {
        if self.action_id != previous.action_id {
            Some("ServiceActionId")
        } else if self.product_id != previous.product_id {
            Some("ProductId")
        } else {
            None
        }
    }
}

/// Engine-visible identity of one association resource instance.
///
/// Minted on create and echoed on every later event, except when an update
/// changes the identity and the instance is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalResourceId(String);

impl PhysicalResourceId {
    /// Mint a fresh random id: `ass-` followed by 13 hex characters.
    pub fn mint() -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{}",
            PHYSICAL_ID_PREFIX,
            &random[..PHYSICAL_ID_RANDOM_LEN]
        ))
    }

    /// Wrap an id received from the engine.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has the shape [`PhysicalResourceId::mint`] produces.
    pub fn is_minted_format(&self) -> bool {
        self.0
            .strip_prefix(PHYSICAL_ID_PREFIX)
            .is_some_and(|rest| {
                rest.len() == PHYSICAL_ID_RANDOM_LEN
                    && rest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            })
    }
}

impl fmt::Display for PhysicalResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The stack a request came from, parsed from its `StackId` ARN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackIdentity {
    /// The raw ARN, echoed back in responses
    pub arn: String,
    pub partition: String,
    pub region: String,
    pub account_id: String,
    pub stack_name: String,
}

impl StackIdentity {
    /// Parse `arn:<partition>:cloudformation:<region>:<account>:stack/<name>/<guid>`
    pub fn parse(arn: &str) -> Result<Self> {
        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" {
            return Err(Error::invalid("StackId", format!("not an ARN: {}", arn)));
        }

        let stack_name = parts[5]
            .strip_prefix("stack/")
            .and_then(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::invalid("StackId", format!("not a stack ARN: {}", arn)))?;

        Ok(Self {
            arn: arn.to_string(),
            partition: parts[1].to_string(),
            region: parts[3].to_string(),
            account_id: parts[4].to_string(),
            stack_name: stack_name.to_string(),
        })
    }
}
