//! Dry-run wrapper: reads go to the real catalog, writes are only recorded.

use crate::backend::CatalogClient;
use crate::error::Result;
use crate::types::{ArtifactSet, AssociationTuple, BatchOperation, ProductId};
use serde::Serialize;
use std::sync::Mutex;

/// A batch that would have been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedBatch {
    /// The bulk operation.
    pub operation: BatchOperation,
    /// The tuples it would carry.
    pub tuples: Vec<AssociationTuple>,
}

/// Wraps a client so that `list_artifact_versions` is forwarded while batch
/// calls are captured for inspection.
#[derive(Debug)]
pub struct DryRunCatalog<C> {
    inner: C,
    planned: Mutex<Vec<PlannedBatch>>,
}

impl<C: CatalogClient> DryRunCatalog<C> {
    /// Wrap `inner`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            planned: Mutex::new(Vec::new()),
        }
    }

    /// Batches captured so far.
    pub fn planned(&self) -> Vec<PlannedBatch> {
        self.planned
            .lock()
            .map(|planned| planned.clone())
            .unwrap_or_default()
    }

    fn record(&self, operation: BatchOperation, tuples: &[AssociationTuple]) {
        log::info!(
            "dry run: would {} {} association(s)",
            operation,
            tuples.len()
        );
        if let Ok(mut planned) = self.planned.lock() {
            planned.push(PlannedBatch {
                operation,
                tuples: tuples.to_vec(),
            });
        }
    }
}

impl<C: CatalogClient> CatalogClient for DryRunCatalog<C> {
    fn batch_associate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        self.record(BatchOperation::Associate, tuples);
        Ok(())
    }

    fn batch_disassociate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        self.record(BatchOperation::Disassociate, tuples);
        Ok(())
    }

    fn list_artifact_versions(&self, product_id: &ProductId) -> Result<ArtifactSet> {
        self.inner.list_artifact_versions(product_id)
    }
}
