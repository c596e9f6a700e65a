//! Lifecycle controller: one event in, at most one batch call out

use crate::association::{AssociationBatch, AssociationSetBuilder, BatchOutcome};
use crate::diff::{ArtifactDiff, DiffEngine};
use crate::error::Result;
use crate::event::{CreateRequest, DeleteRequest, LifecycleRequest, UpdateRequest};
use crate::lifecycle::{LifecycleState, RequestKind};
use crate::resolver::ArtifactResolver;
use crate::types::PhysicalResourceId;
use catalog::CatalogClient;
use serde::Serialize;

/// Result of handling one lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub kind: RequestKind,
    pub from: LifecycleState,
    pub to: LifecycleState,
    /// Id minted or echoed; `None` after a delete
    pub physical_resource_id: Option<PhysicalResourceId>,
    /// The batch built for this event, possibly empty
    pub batch: AssociationBatch,
    pub outcome: BatchOutcome,
    /// Snapshot comparison, updates only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ArtifactDiff>,
}

/// Drives association resources through their lifecycle.
///
/// Stateless between calls: everything needed comes from the request, the
/// resolver and the catalog.
pub struct LifecycleController<C, R> {
    client: C,
    resolver: R,
}

impl<C: CatalogClient, R: ArtifactResolver> LifecycleController<C, R> {
    pub fn new(client: C, resolver: R) -> Self {
        Self { client, resolver }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Handle one event
    pub fn handle(&self, request: &LifecycleRequest) -> Result<Transition> {
        let kind = request.kind();
        let from = LifecycleState::before(kind);
        let to = from.next(kind)?;
        log::debug!(
            "{} via {} resolver: {} -> {}",
            kind,
            self.resolver.name(),
            from,
            to
        );

        let (physical_resource_id, batch, diff) = match request {
            LifecycleRequest::Create(req) => {
                let (id, batch) = self.plan_create(req)?;
                (Some(id), batch, None)
            }
            LifecycleRequest::Update(req) => {
                let (id, batch, diff) = self.plan_update(req)?;
                (Some(id), batch, diff)
            }
            LifecycleRequest::Delete(req) => (None, self.plan_delete(req)?, None),
        };
        let outcome = batch.submit(&self.client)?;

        Ok(Transition {
            kind,
            from,
            to,
            physical_resource_id,
            batch,
            outcome,
            diff,
        })
    }

    /// Associate the full set and mint the resource's id
    pub fn on_create(&self, req: &CreateRequest) -> Result<PhysicalResourceId> {
        let (id, batch) = self.plan_create(req)?;
        batch.submit(&self.client)?;
        Ok(id)
    }

    /// Associate the additions and echo the existing id, or replace the
    /// resource under a new id when its identity changed
    pub fn on_update(&self, req: &UpdateRequest) -> Result<PhysicalResourceId> {
        let (id, batch, _) = self.plan_update(req)?;
        batch.submit(&self.client)?;
        Ok(id)
    }

    /// Disassociate the full set
    pub fn on_delete(&self, req: &DeleteRequest) -> Result<()> {
        self.plan_delete(req)?.submit(&self.client)?;
        Ok(())
    }

    fn plan_create(&self, req: &CreateRequest) -> Result<(PhysicalResourceId, AssociationBatch)> {
        let desired = &req.desired;
        let artifacts = self.resolver.resolve(desired)?;
        let tuples =
            AssociationSetBuilder::build(&desired.action_id, &desired.product_id, &artifacts);

        let id = PhysicalResourceId::mint();
        log::debug!("minted physical id {}", id);
        Ok((id, AssociationBatch::associate(tuples)))
    }

    fn plan_update(
        &self,
        req: &UpdateRequest,
    ) -> Result<(PhysicalResourceId, AssociationBatch, Option<ArtifactDiff>)> {
        let desired = &req.desired;
        let current = self.resolver.resolve(desired)?;

        // A new action or product is a new resource. The engine deletes the
        // old id with the old properties once it sees the new one.
        if let Some(changed) = desired.identity_change(&req.previous) {
            let id = PhysicalResourceId::mint();
            log::info!(
                "{} changed, replacing {} with {}",
                changed,
                req.physical_resource_id,
                id
            );
            let tuples =
                AssociationSetBuilder::build(&desired.action_id, &desired.product_id, &current);
            return Ok((id, AssociationBatch::associate(tuples), None));
        }

        let previous = self.resolver.resolve_previous(&req.previous)?;
        let diff = DiffEngine::compare(&previous, &current);

        if diff.has_gap() {
            if !diff.dangling.is_empty() {
                log::warn!(
                    "{} no longer declared but still associated: {}",
                    req.physical_resource_id,
                    diff.dangling
                );
            }
            if !diff.ignored_additions.is_empty() {
                log::warn!(
                    "{}: artifact set did not grow, not associating {}",
                    req.physical_resource_id,
                    diff.ignored_additions
                );
            }
        }

        let tuples =
            AssociationSetBuilder::build(&desired.action_id, &desired.product_id, &diff.additions);
        Ok((
            req.physical_resource_id.clone(),
            AssociationBatch::associate(tuples),
            Some(diff),
        ))
    }

    fn plan_delete(&self, req: &DeleteRequest) -> Result<AssociationBatch> {
        let desired = &req.desired;
        let artifacts = self.resolver.resolve(desired)?;
        let tuples =
            AssociationSetBuilder::build(&desired.action_id, &desired.product_id, &artifacts);
        Ok(AssociationBatch::disassociate(tuples))
    }
}
