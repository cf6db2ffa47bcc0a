use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client as HttpClient, Url, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{SecretProvider, SecretValue};
use crate::{
    auth::{AwsCredentials, SigV4Signer},
    errors::{MixerError, Result},
    providers::http_client,
    util::now_utc,
};

const SERVICE: &str = "secretsmanager";
const TARGET: &str = "secretsmanager.GetSecretValue";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// AWS Secrets Manager `GetSecretValue`.
#[derive(Debug, Clone)]
pub struct SecretsManagerProvider {
    http_client: HttpClient,
    signer: SigV4Signer,
    endpoint: Url,
}

impl SecretsManagerProvider {
    pub fn new(
        credentials: AwsCredentials,
        region: &str,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            MixerError::other(format!("invalid Secrets Manager endpoint {endpoint}: {err}"))
        })?;

        Ok(Self {
            http_client: http_client(timeout)?,
            signer: SigV4Signer::new(credentials, region, SERVICE),
            endpoint,
        })
    }
}

#[async_trait]
impl SecretProvider for SecretsManagerProvider {
    fn label(&self) -> &'static str {
        "secretsmanager"
    }

    async fn get_secret(&self, name: &str) -> Result<Option<SecretValue>> {
        let body = serde_json::to_vec(&GetSecretValueRequest { secret_id: name })?;
        let signed = self.signer.sign(
            "POST",
            &self.endpoint,
            &[("content-type", AMZ_JSON), ("x-amz-target", TARGET)],
            &body,
            &now_utc(),
        );

        let mut builder = self
            .http_client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, AMZ_JSON)
            .header("x-amz-target", TARGET);
        for (header, value) in signed {
            builder = builder.header(header, value);
        }

        let response = builder.body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<AwsErrorBody>(&body).ok();
            if error.as_ref().is_some_and(AwsErrorBody::is_not_found) {
                return Ok(None);
            }
            let message = error
                .map(AwsErrorBody::describe)
                .unwrap_or(body);
            return Err(MixerError::from_status(SERVICE, status.as_u16(), message));
        }

        let payload: GetSecretValueResponse = response
            .json()
            .await
            .map_err(|err| MixerError::malformed(SERVICE, format!("invalid response body: {err}")))?;

        payload.into_value()
    }
}

#[derive(Serialize)]
struct GetSecretValueRequest<'a> {
    #[serde(rename = "SecretId")]
    secret_id: &'a str,
}

#[derive(Deserialize)]
struct GetSecretValueResponse {
    #[serde(rename = "SecretString", default)]
    secret_string: Option<String>,
    #[serde(rename = "SecretBinary", default)]
    secret_binary: Option<String>,
}

impl GetSecretValueResponse {
    fn into_value(self) -> Result<Option<SecretValue>> {
        if let Some(secret) = self.secret_string {
            return Ok(Some(SecretValue::from_secret_string(secret)));
        }

        if let Some(encoded) = self.secret_binary {
            let bytes = general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|err| MixerError::malformed(SERVICE, format!("SecretBinary is not base64: {err}")))?;
            let text = String::from_utf8(bytes)
                .map_err(|err| MixerError::malformed(SERVICE, format!("SecretBinary is not UTF-8: {err}")))?;
            return Ok(Some(SecretValue::from_secret_string(text)));
        }

        Ok(None)
    }
}

#[derive(Deserialize)]
struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl AwsErrorBody {
    fn is_not_found(&self) -> bool {
        self.kind.ends_with("ResourceNotFoundException")
    }

    fn describe(self) -> String {
        let kind = self.kind.rsplit('#').next().unwrap_or_default().to_string();
        match (kind.is_empty(), self.message.is_empty()) {
            (true, _) => self.message,
            (false, true) => kind,
            (false, false) => format!("{kind}: {}", self.message),
        }
    }
}
