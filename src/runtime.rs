//! Minimal client for the Lambda custom-runtime API

use anyhow::{Context, Result};
use serde::Serialize;

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";

/// One pending invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub request_id: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorReport<'a> {
    error_message: &'a str,
    error_type: &'a str,
}

pub struct RuntimeClient {
    agent: ureq::Agent,
    base: String,
}

impl RuntimeClient {
    /// `api` is the `host:port` from `AWS_LAMBDA_RUNTIME_API`
    pub fn new(api: &str) -> Self {
        // Polling blocks until an event arrives, so no global timeout.
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base: format!("http://{}/{}/runtime", api.trim_end_matches('/'), API_VERSION),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Block until the next invocation
    pub fn next(&self) -> Result<Invocation> {
        let mut response = self
            .agent
            .get(format!("{}/invocation/next", self.base))
            .call()
            .context("Failed to poll for the next invocation")?;

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .with_context(|| format!("Invocation without {}", REQUEST_ID_HEADER))?;
        let body = response
            .body_mut()
            .read_to_string()
            .context("Failed to read invocation body")?;

        Ok(Invocation { request_id, body })
    }

    /// Report a successful invocation
    pub fn respond(&self, request_id: &str, body: &str) -> Result<()> {
        self.agent
            .post(format!("{}/invocation/{}/response", self.base, request_id))
            .header("Content-Type", "application/json")
            .send(body.as_bytes())
            .with_context(|| format!("Failed to acknowledge invocation {}", request_id))?;
        Ok(())
    }

    /// Report a failed invocation
    pub fn fail(&self, request_id: &str, error: &anyhow::Error) -> Result<()> {
        let message = format!("{:#}", error);
        self.post_error(
            &format!("{}/invocation/{}/error", self.base, request_id),
            &message,
        )
        .with_context(|| format!("Failed to report error for invocation {}", request_id))
    }

    /// Report a failure before the first invocation
    pub fn init_error(&self, error: &anyhow::Error) -> Result<()> {
        let message = format!("{:#}", error);
        self.post_error(&format!("{}/init/error", self.base), &message)
            .context("Failed to report initialization error")
    }

    fn post_error(&self, url: &str, message: &str) -> Result<()> {
        let report = ErrorReport {
            error_message: message,
            error_type: "Runtime.HandlerError",
        };
        self.agent
            .post(url)
            .header("Lambda-Runtime-Function-Error-Type", report.error_type)
            .send_json(&report)?;
        Ok(())
    }
}
