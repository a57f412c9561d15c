/// HTTP request step
///
/// Expected params: { "url": "https://api.example.com/data", "method": "GET", "authentication": "github" }
///
/// Issues one request per input item (once when there is no input). When
/// `authentication` names a stored credential, its `token` is sent as a bearer
/// token, or `username`/`password` as basic auth. With `continueOnFail` a
/// failed request yields `{ error, status }` for that item instead of failing
/// the node.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};

use crate::runtime::{ExecutionContext, Step, StepDescription, StepError, StepProperty};
use crate::workflow::types::{Item, NodeOutput};

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

pub struct HttpRequestStep {
    description: StepDescription,
    client: Client,
}

/// A request that did not produce a successful response
#[derive(Debug)]
struct RequestFailure {
    message: String,
    status: Option<u16>,
}

impl HttpRequestStep {
    /// `timeout` bounds each outbound request
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            description: StepDescription::new("HTTP Request", "fa-globe")
                .property(StepProperty::new("url", "string").required())
                .property(StepProperty::new("method", "options").options(METHODS))
                .property(
                    StepProperty::new("authentication", "credential")
                        .describe("Name of a stored credential with `token` or `username`/`password`"),
                ),
            client,
        })
    }

    async fn authorize(
        &self,
        ctx: &ExecutionContext<'_>,
        request: RequestBuilder,
        index: usize,
    ) -> Result<RequestBuilder, StepError> {
        let auth = ctx.node_parameter("authentication", index, Some(Value::Null))?;
        let Some(name) = auth.as_str().filter(|name| !name.is_empty()) else {
            return Ok(request);
        };

        let credentials = ctx.get_credentials(name).await?;
        if let Some(token) = credentials.get("token").and_then(Value::as_str) {
            Ok(request.bearer_auth(token))
        } else if let Some(username) = credentials.get("username").and_then(Value::as_str) {
            let password = credentials.get("password").and_then(Value::as_str);
            Ok(request.basic_auth(username, password))
        } else {
            tracing::warn!("⚠️ Credential '{}' has neither token nor username, sending unauthenticated", name);
            Ok(request)
        }
    }
}

#[async_trait]
impl Step for HttpRequestStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        let iterations = ctx.input_data().len().max(1);
        let mut output = Vec::with_capacity(iterations);

        for index in 0..iterations {
            let url = ctx.parameter_str("url", index, None)?;
            let method_name = ctx.parameter_str("method", index, Some("GET"))?.to_uppercase();
            let method = Method::from_bytes(method_name.as_bytes())
                .map_err(|_| StepError::invalid("method", format!("unsupported HTTP method '{method_name}'")))?;

            tracing::debug!("🌐 {} {}", method, url);
            let request = self.authorize(ctx, self.client.request(method, &url), index).await?;

            match send(request).await {
                Ok(body) => output.push(Item::new(body)),
                Err(failure) if ctx.continue_on_fail() => {
                    ctx.log(format!("request to {url} failed: {}", failure.message));
                    output.push(Item::new(json!({
                        "error": failure.message,
                        "status": failure.status,
                    })));
                }
                Err(failure) => {
                    return Err(anyhow::anyhow!("HTTP request to {} failed: {}", url, failure.message).into());
                }
            }
        }

        Ok(NodeOutput::single(output))
    }
}

/// Send the request; non-2xx statuses are failures, non-JSON bodies become strings
async fn send(request: RequestBuilder) -> Result<Value, RequestFailure> {
    let response = request.send().await.map_err(|e| RequestFailure {
        message: e.to_string(),
        status: e.status().map(|status| status.as_u16()),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RequestFailure {
            message: format!("request failed with status {status}"),
            status: Some(status.as_u16()),
        });
    }

    let body = response.text().await.map_err(|e| RequestFailure {
        message: e.to_string(),
        status: Some(status.as_u16()),
    })?;

    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}
