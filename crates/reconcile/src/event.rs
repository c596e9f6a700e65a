//! Lifecycle event parsing
//!
//! The engine delivers a loosely typed JSON request. Parsing happens in two
//! steps: [`RawRequest`] accepts anything that carries enough metadata to be
//! answered, then [`LifecycleEvent::try_from`] turns it into typed intent.
//! A request that fails the second step can still receive a failure response.

use crate::error::{Error, Result};
use crate::lifecycle::RequestKind;
use crate::types::{DesiredState, PhysicalResourceId, StackIdentity};
use catalog::{ActionId, ArtifactId, ArtifactSet, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator of the artifact list in its string form
pub const ARTIFACT_DELIMITER: char = '|';

const SERVICE_ACTION_ID: &str = "ServiceActionId";
const PRODUCT_ID: &str = "ProductId";
const PROVISIONING_ARTIFACT_IDS: &str = "ProvisioningArtifactIds";

/// A custom-resource request as delivered by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRequest {
    pub request_type: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub old_resource_properties: Option<Map<String, Value>>,
}

impl RawRequest {
    /// Decode a request from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Request metadata needed to answer the engine, independent of the outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub stack: StackIdentity,
    pub request_id: String,
    pub logical_resource_id: String,
    pub response_url: Option<String>,
}

/// Create: nothing exists yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub desired: DesiredState,
}

/// Update: both snapshots plus the id minted on create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub desired: DesiredState,
    pub previous: DesiredState,
    pub physical_resource_id: PhysicalResourceId,
}

/// Delete: the last desired state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub desired: DesiredState,
    pub physical_resource_id: Option<PhysicalResourceId>,
}

/// Typed intent of one lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleRequest {
    Create(CreateRequest),
    Update(UpdateRequest),
    Delete(DeleteRequest),
}

impl LifecycleRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Create(_) => RequestKind::Create,
            Self::Update(_) => RequestKind::Update,
            Self::Delete(_) => RequestKind::Delete,
        }
    }

    /// The current desired state, whatever the kind
    pub fn desired(&self) -> &DesiredState {
        match self {
            Self::Create(req) => &req.desired,
            Self::Update(req) => &req.desired,
            Self::Delete(req) => &req.desired,
        }
    }

    /// The physical id carried by the event, if any
    pub fn physical_resource_id(&self) -> Option<&PhysicalResourceId> {
        match self {
            Self::Create(_) => None,
            Self::Update(req) => Some(&req.physical_resource_id),
            Self::Delete(req) => req.physical_resource_id.as_ref(),
        }
    }
}

/// A fully parsed lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub context: RequestContext,
    pub request: LifecycleRequest,
}

impl LifecycleEvent {
    /// Decode and parse in one step
    pub fn from_json(json: &str) -> Result<Self> {
        Self::try_from(&RawRequest::from_json(json)?)
    }
}

impl TryFrom<&RawRequest> for LifecycleEvent {
    type Error = Error;

    fn try_from(raw: &RawRequest) -> Result<Self> {
        let kind: RequestKind = raw.request_type.parse()?;
        let context = RequestContext {
            stack: StackIdentity::parse(&raw.stack_id)?,
            request_id: raw.request_id.clone(),
            logical_resource_id: raw.logical_resource_id.clone(),
            response_url: raw.response_url.clone(),
        };

        let desired = parse_desired_state("ResourceProperties", raw.resource_properties.as_ref())?;
        let physical_resource_id = raw
            .physical_resource_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(PhysicalResourceId::new);

        let request = match kind {
            RequestKind::Create => LifecycleRequest::Create(CreateRequest { desired }),
            RequestKind::Update => {
                let previous = parse_desired_state(
                    "OldResourceProperties",
                    raw.old_resource_properties.as_ref(),
                )?;
                let physical_resource_id = physical_resource_id
                    .ok_or_else(|| Error::MissingProperty("PhysicalResourceId".to_string()))?;
                LifecycleRequest::Update(UpdateRequest {
                    desired,
                    previous,
                    physical_resource_id,
                })
            }
            RequestKind::Delete => LifecycleRequest::Delete(DeleteRequest {
                desired,
                physical_resource_id,
            }),
        };

        Ok(Self { context, request })
    }
}

/// Parse one property map into a [`DesiredState`]
fn parse_desired_state(section: &str, properties: Option<&Map<String, Value>>) -> Result<DesiredState> {
    let properties = properties.ok_or_else(|| Error::MissingProperty(section.to_string()))?;

    let action_id = ActionId::new(required_string(section, properties, SERVICE_ACTION_ID)?);
    let product_id = ProductId::new(required_string(section, properties, PRODUCT_ID)?);
    let declared = properties
        .get(PROVISIONING_ARTIFACT_IDS)
        .map(|value| parse_artifact_ids(section, value))
        .transpose()?;

    Ok(DesiredState::new(action_id, product_id, declared))
}

fn required_string(section: &str, properties: &Map<String, Value>, name: &str) -> Result<String> {
    let path = format!("{}.{}", section, name);
    match properties.get(name) {
        None | Some(Value::Null) => Err(Error::MissingProperty(path)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(Error::MissingProperty(path)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(Error::invalid(path, format!("expected a string, got {}", other))),
    }
}

/// Accept either the pipe-delimited string form or a JSON list of strings
fn parse_artifact_ids(section: &str, value: &Value) -> Result<ArtifactSet> {
    let path = format!("{}.{}", section, PROVISIONING_ARTIFACT_IDS);
    match value {
        Value::String(s) => Ok(ArtifactSet::from_delimited(s, ARTIFACT_DELIMITER)),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Ok(ArtifactId::from(s.trim())),
                other => Err(Error::invalid(
                    path.clone(),
                    format!("expected non-empty strings, got {}", other),
                )),
            })
            .collect(),
        other => Err(Error::invalid(
            path,
            format!("expected a string or a list of strings, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STACK_ID: &str = "arn:aws:cloudformation:test-region:test-account:stack/test/uuid";

    fn request(request_type: &str) -> Value {
        json!({
            "RequestType": request_type,
            "StackId": STACK_ID,
            "RequestId": "req-1",
            "LogicalResourceId": "Association",
            "ResponseURL": "https://example.com/response",
            "ResourceType": "Custom::ServiceActionAssociation",
            "PhysicalResourceId": "ass-0123456789abc",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:test-region:test-account:function:handler",
                "ServiceActionId": "act-1",
                "ProductId": "prod-1",
                "ProvisioningArtifactIds": "v1|v2"
            },
            "OldResourceProperties": {
                "ServiceActionId": "act-1",
                "ProductId": "prod-1",
                "ProvisioningArtifactIds": "v1"
            }
        })
    }

    fn parse(value: &Value) -> Result<LifecycleEvent> {
        LifecycleEvent::from_json(&value.to_string())
    }

    #[test]
    fn test_parse_create() {
        let mut value = request("Create");
        value.as_object_mut().unwrap().remove("PhysicalResourceId");
        let event = parse(&value).unwrap();

        assert_eq!(event.context.stack.account_id, "test-account");
        assert_eq!(event.context.request_id, "req-1");
        assert_eq!(event.request.kind(), RequestKind::Create);
        assert!(event.request.physical_resource_id().is_none());

        let desired = event.request.desired();
        assert_eq!(desired.action_id.as_str(), "act-1");
        assert_eq!(desired.product_id.as_str(), "prod-1");
        assert_eq!(
            desired.declared.as_ref().unwrap().to_delimited('|'),
            "v1|v2"
        );
    }

    #[test]
    fn test_parse_update() {
        let event = parse(&request("Update")).unwrap();
        match event.request {
            LifecycleRequest::Update(update) => {
                assert_eq!(update.physical_resource_id.as_str(), "ass-0123456789abc");
                assert_eq!(update.previous.declared.unwrap().len(), 1);
                assert_eq!(update.desired.declared.unwrap().len(), 2);
            }
            other => panic!("Expected Update, got {other:?}"),
        }
    }

    #[test]
    fn test_update_requires_physical_id() {
        let mut value = request("Update");
        value.as_object_mut().unwrap().remove("PhysicalResourceId");
        assert!(matches!(
            parse(&value),
            Err(Error::MissingProperty(ref name)) if name == "PhysicalResourceId"
        ));
    }

    #[test]
    fn test_update_requires_old_properties() {
        let mut value = request("Update");
        value.as_object_mut().unwrap().remove("OldResourceProperties");
        assert!(matches!(
            parse(&value),
            Err(Error::MissingProperty(ref name)) if name == "OldResourceProperties"
        ));
    }

    #[test]
    fn test_parse_delete() {
        let event = parse(&request("Delete")).unwrap();
        assert_eq!(event.request.kind(), RequestKind::Delete);
        assert_eq!(
            event.request.physical_resource_id().unwrap().as_str(),
            "ass-0123456789abc"
        );
    }

    #[test]
    fn test_missing_required_property() {
        let mut value = request("Create");
        value["ResourceProperties"]
            .as_object_mut()
            .unwrap()
            .remove("ProductId");
        assert!(matches!(
            parse(&value),
            Err(Error::MissingProperty(ref name)) if name == "ResourceProperties.ProductId"
        ));
    }

    #[test]
    fn test_blank_property_is_missing() {
        let mut value = request("Create");
        value["ResourceProperties"]["ServiceActionId"] = json!("  ");
        assert!(matches!(parse(&value), Err(Error::MissingProperty(_))));
    }

    #[test]
    fn test_artifact_ids_optional() {
        let mut value = request("Create");
        value["ResourceProperties"]
            .as_object_mut()
            .unwrap()
            .remove("ProvisioningArtifactIds");
        let event = parse(&value).unwrap();
        assert!(event.request.desired().declared.is_none());
    }

    #[test]
    fn test_artifact_ids_as_list() {
        let mut value = request("Create");
        value["ResourceProperties"]["ProvisioningArtifactIds"] = json!(["v1", "v2", "v3"]);
        let event = parse(&value).unwrap();
        assert_eq!(event.request.desired().declared.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_artifact_ids_wrong_type() {
        let mut value = request("Create");
        value["ResourceProperties"]["ProvisioningArtifactIds"] = json!(42);
        assert!(matches!(parse(&value), Err(Error::InvalidProperty { .. })));

        value["ResourceProperties"]["ProvisioningArtifactIds"] = json!(["v1", 2]);
        assert!(matches!(parse(&value), Err(Error::InvalidProperty { .. })));
    }

    #[test]
    fn test_unsupported_request_type() {
        assert!(matches!(
            parse(&request("Rename")),
            Err(Error::UnsupportedRequestType(ref t)) if t == "Rename"
        ));
    }

    #[test]
    fn test_raw_request_survives_bad_properties() {
        let mut value = request("Create");
        value.as_object_mut().unwrap().remove("ResourceProperties");
        let raw = RawRequest::from_json(&value.to_string()).unwrap();
        assert_eq!(raw.request_id, "req-1");
        assert!(LifecycleEvent::try_from(&raw).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            LifecycleEvent::from_json("{\"RequestType\":"),
            Err(Error::MalformedEvent(_))
        ));
    }
}
