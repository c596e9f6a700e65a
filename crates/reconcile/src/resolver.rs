//! Artifact resolution strategies
//!
//! A resolver turns a [`DesiredState`] into the concrete set of
//! provisioning artifacts the association should cover. The strategy is
//! fixed per deployment.

use crate::error::{Error, Result};
use crate::types::DesiredState;
use catalog::{ArtifactSet, CatalogClient};

/// Strategy that determines the target artifact set
pub trait ArtifactResolver: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Artifacts the current desired state covers
    fn resolve(&self, desired: &DesiredState) -> Result<ArtifactSet>;

    /// Artifacts the previous desired state covered
    fn resolve_previous(&self, previous: &DesiredState) -> Result<ArtifactSet> {
        self.resolve(previous)
    }
}

impl<T: ArtifactResolver + ?Sized> ArtifactResolver for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resolve(&self, desired: &DesiredState) -> Result<ArtifactSet> {
        (**self).resolve(desired)
    }

    fn resolve_previous(&self, previous: &DesiredState) -> Result<ArtifactSet> {
        (**self).resolve_previous(previous)
    }
}

/// Use the `ProvisioningArtifactIds` property as given
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredArtifacts;

impl DeclaredArtifacts {
    fn declared(desired: &DesiredState, section: &str) -> Result<ArtifactSet> {
        desired.declared.clone().ok_or_else(|| {
            Error::MissingProperty(format!("{}.ProvisioningArtifactIds", section))
        })
    }
}

impl ArtifactResolver for DeclaredArtifacts {
    fn name(&self) -> &'static str {
        "declared"
    }

    fn resolve(&self, desired: &DesiredState) -> Result<ArtifactSet> {
        Self::declared(desired, "ResourceProperties")
    }

    fn resolve_previous(&self, previous: &DesiredState) -> Result<ArtifactSet> {
        Self::declared(previous, "OldResourceProperties")
    }
}

/// Ask the catalog for every artifact the product currently has.
///
/// Any declared artifact list is ignored for the current state. The catalog
/// only knows the present, so the previous state falls back to what was
/// declared then, or nothing.
#[derive(Debug, Clone)]
pub struct DiscoveredArtifacts<C> {
    client: C,
}

impl<C: CatalogClient> DiscoveredArtifacts<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: CatalogClient> ArtifactResolver for DiscoveredArtifacts<C> {
    fn name(&self) -> &'static str {
        "discovered"
    }

    fn resolve(&self, desired: &DesiredState) -> Result<ArtifactSet> {
        let artifacts = self.client.list_artifact_versions(&desired.product_id)?;
        log::debug!(
            "product {} has {} artifact(s): {}",
            desired.product_id,
            artifacts.len(),
            artifacts
        );
        Ok(artifacts)
    }

    fn resolve_previous(&self, previous: &DesiredState) -> Result<ArtifactSet> {
        Ok(previous.declared.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{MockCatalog, RecordedCall};

    fn state(declared: Option<&str>) -> DesiredState {
        DesiredState::new(
            "act-1".into(),
            "prod-2".into(),
            declared.map(|raw| ArtifactSet::from_delimited(raw, '|')),
        )
    }

    #[test]
    fn test_declared_uses_property() {
        let set = DeclaredArtifacts.resolve(&state(Some("v1|v2|v3"))).unwrap();
        assert_eq!(set.to_delimited('|'), "v1|v2|v3");
    }

    #[test]
    fn test_declared_requires_property() {
        let err = DeclaredArtifacts.resolve(&state(None)).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingProperty(ref name) if name == "ResourceProperties.ProvisioningArtifactIds"
        ));

        let err = DeclaredArtifacts.resolve_previous(&state(None)).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingProperty(ref name) if name == "OldResourceProperties.ProvisioningArtifactIds"
        ));
    }

    #[test]
    fn test_discovered_queries_catalog() {
        let mock = MockCatalog::new();
        mock.add_artifacts("prod-2", ["vA", "vB"]);

        let resolver = DiscoveredArtifacts::new(mock.clone());
        let set = resolver.resolve(&state(Some("ignored"))).unwrap();

        assert_eq!(set.to_delimited('|'), "vA|vB");
        assert_eq!(mock.calls(), vec![RecordedCall::List("prod-2".into())]);
    }

    #[test]
    fn test_discovered_previous_does_not_query() {
        let mock = MockCatalog::new();
        let resolver = DiscoveredArtifacts::new(mock.clone());

        assert!(resolver.resolve_previous(&state(None)).unwrap().is_empty());
        assert_eq!(
            resolver
                .resolve_previous(&state(Some("v1")))
                .unwrap()
                .len(),
            1
        );
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_discovered_unknown_product_is_upstream() {
        let resolver = DiscoveredArtifacts::new(MockCatalog::new());
        let err = resolver.resolve(&state(None)).unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[test]
    fn test_boxed_resolver() {
        let resolver: Box<dyn ArtifactResolver> = Box::new(DeclaredArtifacts);
        assert_eq!(resolver.name(), "declared");
        assert_eq!(resolver.resolve(&state(Some("v1"))).unwrap().len(), 1);
    }
}
