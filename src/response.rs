//! Custom-resource responses sent back to the engine

use anyhow::{Context, Result};
use reconcile::{PhysicalResourceId, RawRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest `Reason` sent, in bytes
const MAX_REASON_LEN: usize = 1024;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body of the `PUT` to the request's `ResponseURL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl CustomResourceResponse {
    pub fn success(request: &RawRequest, physical_resource_id: &PhysicalResourceId) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            physical_resource_id: physical_resource_id.to_string(),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
        }
    }

    /// A failure keeps the request's physical id when it has one, so the
    /// engine does not treat the failure as a replacement.
    pub fn failed(request: &RawRequest, reason: &str) -> Self {
        let physical_resource_id = request
            .physical_resource_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| PhysicalResourceId::mint().to_string());
        Self {
            status: ResponseStatus::Failed,
            reason: Some(truncate_reason(reason)),
            physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// PUT the response to the pre-signed `url`
    pub fn send(&self, url: &str) -> Result<()> {
        let body = serde_json::to_string(self)?;
        log::debug!("responding {:?} for {}", self.status, self.request_id);

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(RESPONSE_TIMEOUT))
            .build();
        let agent = ureq::Agent::new_with_config(config);

        // The URL is pre-signed with an empty content type.
        agent
            .put(url)
            .header("Content-Type", "")
            .send(body.as_bytes())
            .context("Failed to send custom-resource response")?;
        Ok(())
    }
}

/// Cut `reason` to [`MAX_REASON_LEN`] bytes on a character boundary
pub fn truncate_reason(reason: &str) -> String {
    if reason.len() <= MAX_REASON_LEN {
        return reason.to_string();
    }
    let suffix = "...";
    let mut end = MAX_REASON_LEN - suffix.len();
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &reason[..end], suffix)
}
