use anyhow::{Context, Result};
use catalog::{CatalogClient, Credentials, ServiceCatalogClient};
use reconcile::{ArtifactResolver, DeclaredArtifacts, DiscoveredArtifacts};
use std::sync::Arc;

use crate::cli::{ArtifactSource, CatalogArgs};

/// Catalog settings resolved from flags and environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub artifact_source: ArtifactSource,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub accept_language: Option<String>,
}

impl From<&CatalogArgs> for Settings {
    fn from(args: &CatalogArgs) -> Self {
        Self {
            artifact_source: args.artifact_source,
            region: non_empty(args.region.as_deref()),
            endpoint: non_empty(args.endpoint.as_deref()),
            accept_language: non_empty(args.accept_language.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Settings {
    /// The configured region, or `fallback` (usually the stack's region)
    pub fn region(&self, fallback: Option<&str>) -> Result<String> {
        self.region
            .clone()
            .or_else(|| non_empty(fallback))
            .context("No region configured: pass --region or set AWS_REGION")
    }

    /// Build the HTTP catalog client, reading credentials from the environment
    pub fn catalog_client(&self, fallback_region: Option<&str>) -> Result<Arc<ServiceCatalogClient>> {
        let region = self.region(fallback_region)?;
        let credentials = Credentials::from_env().context("Could not load AWS credentials")?;

        let mut client = ServiceCatalogClient::new(&region, credentials);
        if let Some(endpoint) = &self.endpoint {
            client = client.with_endpoint(endpoint);
        }
        if let Some(language) = &self.accept_language {
            client = client.with_accept_language(language);
        }

        log::debug!("catalog endpoint {} ({})", client.endpoint(), region);
        Ok(Arc::new(client))
    }

    /// Build the resolver for the configured artifact source
    pub fn resolver<C>(&self, client: C) -> Box<dyn ArtifactResolver>
    where
        C: CatalogClient + 'static,
    {
        match self.artifact_source {
            ArtifactSource::Declared => Box::new(DeclaredArtifacts),
            ArtifactSource::Discovered => Box::new(DiscoveredArtifacts::new(client)),
        }
    }
}
