//! Glue between a raw event, the controller and the engine response

use anyhow::{Context, Result};
use catalog::CatalogClient;
use reconcile::{
    ArtifactResolver, LifecycleController, LifecycleEvent, PhysicalResourceId, RawRequest,
    Transition,
};

use crate::response::CustomResourceResponse;

/// Everything produced by handling one event
#[derive(Debug)]
pub struct Handled {
    pub request: RawRequest,
    pub response: CustomResourceResponse,
    /// Absent when the event failed
    pub transition: Option<Transition>,
}

impl Handled {
    /// Deliver the response to the event's `ResponseURL`
    pub fn respond(&self) -> Result<()> {
        let url = self
            .request
            .response_url
            .as_deref()
            .context("Event has no ResponseURL")?;
        self.response.send(url)
    }
}

/// Decode the envelope of an event.
///
/// Only a request missing its metadata fails here; anything else is
/// answered through the response.
pub fn decode(body: &str) -> Result<RawRequest> {
    RawRequest::from_json(body).context("Could not decode lifecycle event")
}

/// Handle one decoded event, turning any failure into a FAILED response
pub fn handle<C, R>(controller: &LifecycleController<C, R>, request: RawRequest) -> Handled
where
    C: CatalogClient,
    R: ArtifactResolver,
{
    log::debug!(
        "{} {} for {} ({})",
        request.request_type,
        request.resource_type.as_deref().unwrap_or("resource"),
        request.logical_resource_id,
        request.request_id
    );

    let result = LifecycleEvent::try_from(&request)
        .and_then(|event| controller.handle(&event.request));

    match result {
        Ok(transition) => {
            // Delete yields no id; answer with the one the engine sent.
            let physical_resource_id = transition
                .physical_resource_id
                .clone()
                .or_else(|| {
                    request
                        .physical_resource_id
                        .as_deref()
                        .filter(|id| !id.is_empty())
                        .map(PhysicalResourceId::new)
                })
                .unwrap_or_else(PhysicalResourceId::mint);
            log::info!(
                "{} {}: {} -> {}",
                transition.kind,
                physical_resource_id,
                transition.from,
                transition.to
            );
            let response = CustomResourceResponse::success(&request, &physical_resource_id);
            Handled {
                request,
                response,
                transition: Some(transition),
            }
        }
        Err(err) => {
            log::error!(
                "{} {} failed ({}, retryable: {}): {}",
                request.request_type,
                request.logical_resource_id,
                err.kind(),
                err.is_retryable(),
                err
            );
            let response = CustomResourceResponse::failed(&request, &err.to_string());
            Handled {
                request,
                response,
                transition: None,
            }
        }
    }
}
