//! AWS Service Catalog backend.
//!
//! Speaks the AWS JSON 1.1 protocol directly: every operation is a signed
//! `POST /` whose `X-Amz-Target` header names the operation.
//!
//! # Retries
//!
//! None. A failed call is returned as-is and the caller decides whether the
//! whole lifecycle event is retried.

use crate::backend::{CatalogClient, check_batch_outcome, check_batch_size};
use crate::error::{Error, Result};
use crate::signing::{Credentials, Signer};
use crate::types::{
    ArtifactId, ArtifactSet, AssociationTuple, BatchOperation, FailedAssociation, ProductId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWS242ServiceCatalogService";
const SIGNING_SERVICE: &str = "servicecatalog";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Service Catalog client.
///
/// # Example
///
/// ```no_run
/// use catalog::backend::CatalogClient;
/// use catalog::backend::service_catalog::ServiceCatalogClient;
/// use catalog::{Credentials, ProductId};
///
/// let credentials = Credentials::from_env().unwrap();
/// let client = ServiceCatalogClient::new("us-east-1", credentials);
/// let artifacts = client.list_artifact_versions(&ProductId::from("prod-abc123")).unwrap();
/// println!("{} versions", artifacts.len());
/// ```
pub struct ServiceCatalogClient {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Endpoint URL.
    endpoint: String,
    /// Signing region.
    region: String,
    credentials: Credentials,
    accept_language: Option<String>,
}

impl ServiceCatalogClient {
    /// Create a client for the regional public endpoint.
    #[must_use]
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Self {
        let region = region.into();
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint: format!("https://servicecatalog.{}.amazonaws.com", region),
            region,
            credentials,
            accept_language: None,
        }
    }

    /// Use a custom endpoint (VPC endpoint, local emulator).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Send `AcceptLanguage` with every request (`en`, `jp`, `zh`).
    #[must_use]
    pub fn with_accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    /// Get the current endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Host (and port, if any) of the endpoint, as sent in the `Host` header.
    fn host(&self) -> &str {
        let without_scheme = self
            .endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, rest)| rest);
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }

    fn target(operation: &str) -> String {
        format!("{}.{}", TARGET_PREFIX, operation)
    }

    /// Invoke one operation and decode its response.
    fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let target = Self::target(operation);
        let signer = Signer::new(&self.credentials, &self.region, SIGNING_SERVICE);
        let signed = signer.sign_post(
            self.host(),
            &[("Content-Type", CONTENT_TYPE), ("X-Amz-Target", &target)],
            &body,
            chrono::Utc::now(),
        );

        log::debug!("POST {} ({})", self.endpoint, operation);

        // The signed set already carries content-type and x-amz-target.
        let mut builder = self.agent.post(&self.endpoint);
        for (name, value) in &signed {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.send(&body[..])?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;

        if !(200..300).contains(&status) {
            return Err(api_error(operation, status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }

    fn batch(&self, operation: BatchOperation, tuples: &[AssociationTuple]) -> Result<()> {
        check_batch_size(operation, tuples.len())?;
        let request = BatchRequest {
            service_action_associations: tuples,
            accept_language: self.accept_language.as_deref(),
        };
        let response: BatchResponse = self.call(operation.api_name(), &request)?;
        check_batch_outcome(
            operation,
            tuples.len(),
            response.failed_service_action_associations,
        )
    }
}

impl CatalogClient for ServiceCatalogClient {
    fn batch_associate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        self.batch(BatchOperation::Associate, tuples)
    }

    fn batch_disassociate(&self, tuples: &[AssociationTuple]) -> Result<()> {
        self.batch(BatchOperation::Disassociate, tuples)
    }

    fn list_artifact_versions(&self, product_id: &ProductId) -> Result<ArtifactSet> {
        let request = ListArtifactsRequest {
            product_id,
            accept_language: self.accept_language.as_deref(),
        };
        let response: ListArtifactsResponse = self.call("ListProvisioningArtifacts", &request)?;
        Ok(response.into_artifact_set())
    }
}

/// Build an [`Error::Api`] from an error response body.
fn api_error(operation: &str, status: u16, body: &str) -> Error {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .error_type
        .as_deref()
        .map(normalize_error_code)
        .unwrap_or_else(|| format!("HTTP{}", status));
    let message = parsed
        .message
        .or(parsed.message_upper)
        .unwrap_or_else(|| body.trim().to_string());

    Error::Api {
        operation: operation.to_string(),
        code,
        message,
        status,
    }
}

/// `"com.amazonaws.servicecatalog#ResourceNotFoundException:http://..."` →
/// `"ResourceNotFoundException"`.
fn normalize_error_code(raw: &str) -> String {
    let after_hash = raw.rsplit('#').next().unwrap_or(raw);
    after_hash
        .split(':')
        .next()
        .unwrap_or(after_hash)
        .to_string()
}

// =============================================================================
// Service Catalog wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BatchRequest<'a> {
    service_action_associations: &'a [AssociationTuple],
    #[serde(skip_serializing_if = "Option::is_none")]
    accept_language: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BatchResponse {
    #[serde(default)]
    failed_service_action_associations: Vec<FailedAssociation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListArtifactsRequest<'a> {
    product_id: &'a ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    accept_language: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListArtifactsResponse {
    #[serde(default)]
    provisioning_artifact_details: Vec<ArtifactDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ArtifactDetail {
    id: ArtifactId,
    #[serde(default)]
    created_time: Option<f64>,
}

impl ListArtifactsResponse {
    /// Artifacts ordered by creation time, oldest first.
    fn into_artifact_set(mut self) -> ArtifactSet {
        self.provisioning_artifact_details.sort_by(|a, b| {
            a.created_time
                .unwrap_or_default()
                .total_cmp(&b.created_time.unwrap_or_default())
        });
        self.provisioning_artifact_details
            .into_iter()
            .map(|detail| detail.id)
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    message: Option<String>,
    #[serde(rename = "Message")]
    message_upper: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn client() -> ServiceCatalogClient {
        ServiceCatalogClient::new("us-east-1", Credentials::new("AKID", "secret", None))
    }

    #[test]
    fn test_default_endpoint() {
        let client = client();
        assert_eq!(client.endpoint(), "https://servicecatalog.us-east-1.amazonaws.com");
        assert_eq!(client.host(), "servicecatalog.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_custom_endpoint() {
        let client = client().with_endpoint("http://localhost:4566/");
        assert_eq!(client.endpoint(), "http://localhost:4566");
        assert_eq!(client.host(), "localhost:4566");
    }

    #[test]
    fn test_oversized_batch_is_not_sent() {
        // Nothing listens here; reaching the network would be an HttpError.
        let client = client().with_endpoint("http://127.0.0.1:1");
        let tuples: Vec<_> = (0..60)
            .map(|i| AssociationTuple::new("act-1".into(), "prod-1".into(), format!("v{i}").into()))
            .collect();

        let err = client.batch_disassociate(&tuples).unwrap_err();
        assert!(matches!(err, Error::BatchTooLarge { count: 60, .. }));
        assert_eq!(err.category(), ErrorCategory::Rejected);
    }

    #[test]
    fn test_target() {
        assert_eq!(
            ServiceCatalogClient::target("ListProvisioningArtifacts"),
            "AWS242ServiceCatalogService.ListProvisioningArtifacts"
        );
    }

    #[test]
    fn test_batch_request_serialization() {
        let tuples = vec![AssociationTuple::new("act-1".into(), "prod-1".into(), "pa-1".into())];
        let request = BatchRequest {
            service_action_associations: &tuples,
            accept_language: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ServiceActionAssociations": [{
                    "ServiceActionId": "act-1",
                    "ProductId": "prod-1",
                    "ProvisioningArtifactId": "pa-1"
                }]
            })
        );
    }

    #[test]
    fn test_list_request_with_language() {
        let product = ProductId::from("prod-1");
        let request = ListArtifactsRequest {
            product_id: &product,
            accept_language: Some("jp"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ProductId"], "prod-1");
        assert_eq!(json["AcceptLanguage"], "jp");
    }

    #[test]
    fn test_batch_response_parse() {
        let response: BatchResponse = serde_json::from_str(
            r#"{"FailedServiceActionAssociations": [{
                "ServiceActionId": "act-1",
                "ProductId": "prod-1",
                "ProvisioningArtifactId": "pa-1",
                "ErrorCode": "DUPLICATE_RESOURCE",
                "ErrorMessage": "exists"
            }]}"#,
        )
        .unwrap();
        assert_eq!(response.failed_service_action_associations.len(), 1);

        let empty: BatchResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.failed_service_action_associations.is_empty());
    }

    #[test]
    fn test_list_response_ordered_by_creation() {
        let response: ListArtifactsResponse = serde_json::from_str(
            r#"{"ProvisioningArtifactDetails": [
                {"Id": "pa-new", "Name": "v2", "CreatedTime": 1700000500.0, "Active": true},
                {"Id": "pa-old", "Name": "v1", "CreatedTime": 1700000000.0, "Active": false}
            ]}"#,
        )
        .unwrap();
        let set = response.into_artifact_set();
        assert_eq!(set.to_delimited('|'), "pa-old|pa-new");
    }

    #[test]
    fn test_api_error_parse() {
        let err = api_error(
            "ListProvisioningArtifacts",
            400,
            r#"{"__type": "com.amazonaws.servicecatalog#ResourceNotFoundException", "message": "Product not found"}"#,
        );
        match &err {
            Error::Api { code, message, status, .. } => {
                assert_eq!(code, "ResourceNotFoundException");
                assert_eq!(message, "Product not found");
                assert_eq!(*status, 400);
            }
            other => panic!("Expected Error::Api, got {other:?}"),
        }
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_api_error_unparseable_body() {
        let err = api_error("BatchAssociateServiceActionWithProvisioningArtifact", 503, "Service Unavailable");
        match &err {
            Error::Api { code, message, .. } => {
                assert_eq!(code, "HTTP503");
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("Expected Error::Api, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[test]
    fn test_normalize_error_code() {
        assert_eq!(normalize_error_code("ThrottlingException"), "ThrottlingException");
        assert_eq!(
            normalize_error_code("com.amazonaws#InvalidParametersException:http://internal"),
            "InvalidParametersException"
        );
    }
}
