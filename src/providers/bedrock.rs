use std::time::Duration;

use reqwest::{Client as HttpClient, Url, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    auth::{AwsCredentials, SigV4Signer, uri_encode},
    errors::{MixerError, Result},
    util::now_utc,
};

pub const SERVICE: &str = "bedrock";
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Thin client for the Bedrock runtime `InvokeModel` operation using the
/// Anthropic messages body format.
#[derive(Debug, Clone)]
pub struct BedrockClient {
    http_client: HttpClient,
    signer: SigV4Signer,
    endpoint: Url,
}

impl BedrockClient {
    pub fn new(
        credentials: AwsCredentials,
        region: &str,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| MixerError::other(format!("invalid Bedrock endpoint {endpoint}: {err}")))?;

        Ok(Self {
            http_client: super::http_client(timeout)?,
            signer: SigV4Signer::new(credentials, region, SERVICE),
            endpoint,
        })
    }

    pub fn invoke_url(&self, model_id: &str) -> Result<Url> {
        let path = format!("model/{}/invoke", uri_encode(model_id, true));
        self.endpoint
            .join(&path)
            .map_err(|err| MixerError::other(format!("invalid Bedrock invoke url: {err}")))
    }

    pub async fn invoke(
        &self,
        model_id: &str,
        request: &AnthropicRequest<'_>,
    ) -> Result<AnthropicResponse> {
        let url = self.invoke_url(model_id)?;
        let body = serde_json::to_vec(request)?;

        let signed = self.signer.sign(
            "POST",
            &url,
            &[("content-type", "application/json"), ("accept", "application/json")],
            &body,
            &now_utc(),
        );

        let mut builder = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header("accept", "application/json");
        for (name, value) in signed {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MixerError::from_status(
                SERVICE,
                status.as_u16(),
                error_message(&body),
            ));
        }

        let text = response.text().await?;
        debug!(target: "bedrock", model_id, bytes = text.len(), "model responded");

        serde_json::from_str(&text)
            .map_err(|err| MixerError::malformed(SERVICE, format!("invalid response body: {err}")))
    }
}

#[derive(Debug, Serialize)]
pub struct AnthropicRequest<'a> {
    pub anthropic_version: &'a str,
    pub max_tokens: u32,
    pub messages: Vec<AnthropicMessage<'a>>,
}

impl<'a> AnthropicRequest<'a> {
    pub fn single_turn(prompt: &'a str, max_tokens: u32) -> Self {
        Self {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnthropicMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl AnthropicResponse {
    /// Text of the first content block, if that block carries any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first()?.text.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "Message")]
    message: String,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|err| err.message)
        .unwrap_or_else(|_| body.to_string())
}
