//! Building and submitting association batches

use crate::error::{Error, Result};
use catalog::{
    ActionId, ArtifactSet, AssociationTuple, BatchOperation, CatalogClient, MAX_BATCH_SIZE,
    ProductId,
};
use serde::Serialize;

/// Expands an artifact set into association tuples
pub struct AssociationSetBuilder;

impl AssociationSetBuilder {
    /// One tuple per artifact, in the set's order
    pub fn build(
        action_id: &ActionId,
        product_id: &ProductId,
        artifacts: &ArtifactSet,
    ) -> Vec<AssociationTuple> {
        artifacts
            .iter()
            .map(|artifact| {
                AssociationTuple::new(action_id.clone(), product_id.clone(), artifact.clone())
            })
            .collect()
    }
}

/// What happened to a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Sent to the catalog and accepted
    Submitted { count: usize },
    /// Nothing to send
    Skipped,
}

/// One batch call, associate or disassociate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationBatch {
    pub operation: BatchOperation,
    pub tuples: Vec<AssociationTuple>,
}

impl AssociationBatch {
    pub fn associate(tuples: Vec<AssociationTuple>) -> Self {
        Self {
            operation: BatchOperation::Associate,
            tuples,
        }
    }

    pub fn disassociate(tuples: Vec<AssociationTuple>) -> Self {
        Self {
            operation: BatchOperation::Disassociate,
            tuples,
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Send the batch. An empty batch never reaches the catalog, and neither
    /// does one over the catalog's per-request limit.
    pub fn submit<C: CatalogClient + ?Sized>(&self, client: &C) -> Result<BatchOutcome> {
        if self.is_empty() {
            log::debug!("{}: nothing to send", self.operation);
            return Ok(BatchOutcome::Skipped);
        }
        if self.len() > MAX_BATCH_SIZE {
            return Err(Error::invalid(
                "ProvisioningArtifactIds",
                format!(
                    "{} artifacts to {}, the catalog accepts at most {} per request",
                    self.len(),
                    self.operation,
                    MAX_BATCH_SIZE
                ),
            ));
        }

        log::info!("{}: {} tuple(s)", self.operation, self.len());
        for tuple in &self.tuples {
            log::debug!("  {}", tuple);
        }
        match self.operation {
            BatchOperation::Associate => client.batch_associate(&self.tuples)?,
            BatchOperation::Disassociate => client.batch_disassociate(&self.tuples)?,
        }

        Ok(BatchOutcome::Submitted { count: self.len() })
    }
}
