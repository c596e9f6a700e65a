//! Client trait and implementations for the association API.
//!
//! This module provides the [`CatalogClient`] trait and its implementations.
//! The production implementation is [`service_catalog::ServiceCatalogClient`];
//! [`dry_run::DryRunCatalog`] wraps any client and records writes instead of
//! sending them.
//!
//! # Testing
//!
//! Use [`MockCatalog`] for testing without network access:
//!
//! ```
//! use catalog::backend::{CatalogClient, MockCatalog};
//! use catalog::ProductId;
//!
//! let mock = MockCatalog::new();
//! mock.add_artifacts("prod-2", ["vA", "vB"]);
//!
//! let artifacts = mock.list_artifact_versions(&ProductId::from("prod-2")).unwrap();
//! assert_eq!(artifacts.len(), 2);
//! ```

pub mod dry_run;
pub mod service_catalog;

use crate::error::{Error, Result};
use crate::types::{
    ArtifactId, ArtifactSet, AssociationTuple, BatchOperation, FailedAssociation,
    MAX_BATCH_SIZE, ProductId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The bulk association API.
///
/// Implementations perform exactly one remote call per method invocation and
/// never retry. An empty batch is a caller error; callers skip the call
/// instead of sending one.
pub trait CatalogClient: Send + Sync {
    /// Associate every tuple's action with its artifact.
    ///
    /// Tuples that were already associated are not an error.
    fn batch_associate(&self, tuples: &[AssociationTuple]) -> Result<()>;

    /// Remove every tuple's association.
    ///
    /// Tuples that were not associated are not an error.
    fn batch_disassociate(&self, tuples: &[AssociationTuple]) -> Result<()>;

    /// List every artifact currently registered under `product_id`.
    fn list_artifact_versions(&self, product_id: &ProductId) -> Result<ArtifactSet>;
}

impl<T: CatalogClient + ?Sized> CatalogClient for &T {
    fn batch_associate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        (**self).batch_associate(tuples)
    }

    fn batch_disassociate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        (**self).batch_disassociate(tuples)
    }

    fn list_artifact_versions(&self, product_id: &ProductId) -> Result<ArtifactSet> {
        (**self).list_artifact_versions(product_id)
    }
}

impl<T: CatalogClient + ?Sized> CatalogClient for Arc<T> {
    fn batch_associate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        (**self).batch_associate(tuples)
    }

    fn batch_disassociate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        (**self).batch_disassociate(tuples)
    }

    fn list_artifact_versions(&self, product_id: &ProductId) -> Result<ArtifactSet> {
        (**self).list_artifact_versions(product_id)
    }
}

impl<T: CatalogClient + ?Sized> CatalogClient for Box<T> {
    fn batch_associate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        (**self).batch_associate(tuples)
    }

    fn batch_disassociate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        (**self).batch_disassociate(tuples)
    }

    fn list_artifact_versions(&self, product_id: &ProductId) -> Result<ArtifactSet> {
        (**self).list_artifact_versions(product_id)
    }
}

/// Refuse a batch the catalog would reject for its size.
pub fn check_batch_size(operation: BatchOperation, count: usize) -> Result<()> {
    if count > MAX_BATCH_SIZE {
        return Err(Error::BatchTooLarge {
            operation,
            count,
            limit: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

/// Turn the per-tuple failures of an accepted batch into an all-or-nothing result.
///
/// Failures carrying the operation's idempotent error code are dropped; any
/// other failure rejects the whole batch.
pub fn check_batch_outcome(
    operation: BatchOperation,
    total: usize,
    failed: Vec<FailedAssociation>,
) -> Result<()> {
    let idempotent = operation.idempotent_error_code();
    let (ignored, failed): (Vec<_>, Vec<_>) = failed
        .into_iter()
        .partition(|f| f.error_code == idempotent);

    for f in &ignored {
        log::debug!("batch {}: ignoring {}", operation, f);
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::BatchRejected {
            operation,
            total,
            failed,
        })
    }
}

/// A call observed by [`MockCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `batch_associate` with these tuples.
    Associate(Vec<AssociationTuple>),
    /// `batch_disassociate` with these tuples.
    Disassociate(Vec<AssociationTuple>),
    /// `list_artifact_versions` for this product.
    List(ProductId),
}

#[derive(Debug, Default)]
struct MockState {
    artifacts: HashMap<ProductId, ArtifactSet>,
    associations: Vec<AssociationTuple>,
    calls: Vec<RecordedCall>,
    api_failure: Option<String>,
    refused: HashMap<String, String>,
}

/// In-memory catalog for testing without network access.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the recorded calls through another.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    state: Arc<Mutex<MockState>>,
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register artifacts under a product.
    pub fn add_artifacts<I, S>(&self, product_id: &str, artifacts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock().unwrap();
        let set = state.artifacts.entry(ProductId::from(product_id)).or_default();
        for artifact in artifacts {
            let id: String = artifact.into();
            set.insert(ArtifactId::from(id));
        }
    }

    /// Make every subsequent call fail with an API error carrying `code`.
    pub fn fail_with(&self, code: impl Into<String>) {
        self.state.lock().unwrap().api_failure = Some(code.into());
    }

    /// Make batches refuse the given artifact with a per-tuple error code.
    pub fn refuse_artifact(&self, artifact_id: impl Into<String>, error_code: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .refused
            .insert(artifact_id.into(), error_code.into());
    }

    /// All calls observed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Only the batch calls observed so far.
    #[must_use]
    pub fn batch_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, RecordedCall::List(_)))
            .collect()
    }

    /// Associations currently held by the mock.
    #[must_use]
    pub fn associations(&self) -> Vec<AssociationTuple> {
        self.state.lock().unwrap().associations.clone()
    }

    fn apply_batch(&self, operation: BatchOperation, tuples: &[AssociationTuple]) -> Result<()> {
        check_batch_size(operation, tuples.len())?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(match operation {
            BatchOperation::Associate => RecordedCall::Associate(tuples.to_vec()),
            BatchOperation::Disassociate => RecordedCall::Disassociate(tuples.to_vec()),
        });

        if let Some(code) = &state.api_failure {
            return Err(Error::Api {
                operation: operation.api_name().to_string(),
                code: code.clone(),
                message: "injected failure".to_string(),
                status: 400,
            });
        }
        if tuples.is_empty() {
            return Err(Error::Api {
                operation: operation.api_name().to_string(),
                code: "InvalidParametersException".to_string(),
                message: "ServiceActionAssociations must not be empty".to_string(),
                status: 400,
            });
        }

        let mut failed = Vec::new();
        for tuple in tuples {
            if let Some(code) = state.refused.get(tuple.artifact_id.as_str()) {
                failed.push(FailedAssociation {
                    tuple: tuple.clone(),
                    error_code: code.clone(),
                    error_message: "refused by mock".to_string(),
                });
                continue;
            }
            let existing = state.associations.iter().position(|a| a == tuple);
            match (operation, existing) {
                (BatchOperation::Associate, None) => state.associations.push(tuple.clone()),
                (BatchOperation::Associate, Some(_)) => failed.push(FailedAssociation {
                    tuple: tuple.clone(),
                    error_code: operation.idempotent_error_code().to_string(),
                    error_message: "already associated".to_string(),
                }),
                (BatchOperation::Disassociate, Some(index)) => {
                    state.associations.remove(index);
                }
                (BatchOperation::Disassociate, None) => failed.push(FailedAssociation {
                    tuple: tuple.clone(),
                    error_code: operation.idempotent_error_code().to_string(),
                    error_message: "not associated".to_string(),
                }),
            }
        }
        drop(state);

        check_batch_outcome(operation, tuples.len(), failed)
    }
}

impl CatalogClient for MockCatalog {
    fn batch_associate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        self.apply_batch(BatchOperation::Associate, tuples)
    }

    fn batch_disassociate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        self.apply_batch(BatchOperation::Disassociate, tuples)
    }

    fn list_artifact_versions(&self, product_id: &ProductId) -> Result<ArtifactSet> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::List(product_id.clone()));

        if let Some(code) = &state.api_failure {
            return Err(Error::Api {
                operation: "ListProvisioningArtifacts".to_string(),
                code: code.clone(),
                message: "injected failure".to_string(),
                status: 400,
            });
        }

        state
            .artifacts
            .get(product_id)
            .cloned()
            .ok_or_else(|| Error::Api {
                operation: "ListProvisioningArtifacts".to_string(),
                code: "ResourceNotFoundException".to_string(),
                message: format!("product {} not found", product_id),
                status: 400,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn tuple(artifact: &str) -> AssociationTuple {
        AssociationTuple::new("act-1".into(), "prod-1".into(), artifact.into())
    }

    #[test]
    fn test_mock_catalog_new() {
        let mock = MockCatalog::new();
        assert!(mock.calls().is_empty());
        assert!(mock.associations().is_empty());
    }

    #[test]
    fn test_mock_list_artifacts() {
        let mock = MockCatalog::new();
        mock.add_artifacts("prod-2", ["vA", "vB"]);

        let artifacts = mock.list_artifact_versions(&"prod-2".into()).unwrap();
        assert_eq!(artifacts, ArtifactSet::from_delimited("vA|vB", '|'));
        assert_eq!(mock.calls(), vec![RecordedCall::List("prod-2".into())]);
    }

    #[test]
    fn test_mock_list_unknown_product() {
        let mock = MockCatalog::new();
        let err = mock.list_artifact_versions(&"missing".into()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_mock_associate_is_idempotent() {
        let mock = MockCatalog::new();
        mock.batch_associate(&[tuple("v1"), tuple("v2")]).unwrap();
        mock.batch_associate(&[tuple("v1")]).unwrap();

        assert_eq!(mock.associations().len(), 2);
        assert_eq!(mock.batch_calls().len(), 2);
    }

    #[test]
    fn test_mock_disassociate_missing_is_ok() {
        let mock = MockCatalog::new();
        mock.batch_associate(&[tuple("v1")]).unwrap();
        mock.batch_disassociate(&[tuple("v1"), tuple("v9")]).unwrap();
        assert!(mock.associations().is_empty());
    }

    #[test]
    fn test_mock_rejects_empty_batch() {
        let mock = MockCatalog::new();
        assert!(mock.batch_associate(&[]).is_err());
    }

    #[test]
    fn test_mock_rejects_oversized_batch_without_recording() {
        let mock = MockCatalog::new();
        let tuples: Vec<_> = (0..=MAX_BATCH_SIZE).map(|i| tuple(&format!("v{i}"))).collect();

        let err = mock.batch_associate(&tuples).unwrap_err();
        assert!(matches!(err, Error::BatchTooLarge { count: 51, limit: 50, .. }));
        assert!(mock.calls().is_empty());

        assert!(mock.batch_associate(&tuples[..MAX_BATCH_SIZE]).is_ok());
        assert_eq!(mock.associations().len(), MAX_BATCH_SIZE);
    }

    #[test]
    fn test_mock_refused_artifact_rejects_batch() {
        let mock = MockCatalog::new();
        mock.refuse_artifact("v2", "LIMIT_EXCEEDED");

        let err = mock.batch_associate(&[tuple("v1"), tuple("v2")]).unwrap_err();
        match err {
            Error::BatchRejected { total, failed, .. } => {
                assert_eq!(total, 2);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].tuple.artifact_id.as_str(), "v2");
            }
            other => panic!("Expected Error::BatchRejected, got {other:?}"),
        }
    }

    #[test]
    fn test_mock_fail_with() {
        let mock = MockCatalog::new();
        mock.fail_with("ThrottlingException");
        let err = mock.batch_associate(&[tuple("v1")]).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_clones_share_state() {
        let mock = MockCatalog::new();
        let handle = mock.clone();
        handle.batch_associate(&[tuple("v1")]).unwrap();
        assert_eq!(mock.associations().len(), 1);
    }

    #[test]
    fn test_client_through_arc() {
        let mock = Arc::new(MockCatalog::new());
        mock.add_artifacts("prod-1", ["v1"]);
        let client: Arc<dyn CatalogClient> = mock.clone();
        assert_eq!(client.list_artifact_versions(&"prod-1".into()).unwrap().len(), 1);
    }

    #[test]
    fn test_check_batch_outcome() {
        let duplicate = FailedAssociation {
            tuple: tuple("v1"),
            error_code: "DUPLICATE_RESOURCE".to_string(),
            error_message: String::new(),
        };
        assert!(check_batch_outcome(BatchOperation::Associate, 1, vec![duplicate.clone()]).is_ok());
        assert!(check_batch_outcome(BatchOperation::Disassociate, 1, vec![duplicate]).is_err());
        assert!(check_batch_outcome(BatchOperation::Associate, 3, Vec::new()).is_ok());
    }
}
