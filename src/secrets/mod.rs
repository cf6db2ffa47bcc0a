//! Credential lookup.
//!
//! Components never read the environment themselves. They receive resolved
//! values from a [`SecretProvider`], which keeps them testable with fixed
//! credentials. The default chain checks the process environment first and
//! then AWS Secrets Manager.

mod secrets_manager;

pub use secrets_manager::SecretsManagerProvider;

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    auth::AwsCredentials,
    config::SecretsConfig,
    errors::{MixerError, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SecretValue {
    Plain(String),
    Json(Value),
}

impl SecretValue {
    /// Parses a stored secret string as JSON when it is valid JSON and keeps it verbatim otherwise.
    pub fn from_secret_string(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Plain(raw),
        }
    }

    /// Extracts a single text value, reading `field` out of JSON objects.
    pub fn extract(&self, field: Option<&str>) -> Option<String> {
        let text = match (self, field) {
            (Self::Plain(text), None) => Some(text.clone()),
            (Self::Plain(_), Some(_)) => None,
            (Self::Json(Value::Object(map)), Some(field)) => map.get(field).and_then(scalar_text),
            (Self::Json(Value::Object(_)), None) => None,
            (Self::Json(value), None) => scalar_text(value),
            (Self::Json(_), Some(_)) => None,
        };
        text.filter(|value| !value.is_empty())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// `name` or `name#field`, where `field` picks one member of a JSON secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    name: String,
    field: Option<String>,
}

impl SecretRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once('#') {
            Some((name, field)) if !field.is_empty() => Self {
                name: name.to_string(),
                field: Some(field.to_string()),
            },
            Some((name, _)) => Self {
                name: name.to_string(),
                field: None,
            },
            None => Self {
                name: raw.to_string(),
                field: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}#{}", self.name, field),
            None => write!(f, "{}", self.name),
        }
    }
}

#[async_trait]
pub trait SecretProvider: Send + Sync {
    fn label(&self) -> &'static str;

    /// `Ok(None)` means this provider does not hold the secret.
    async fn get_secret(&self, name: &str) -> Result<Option<SecretValue>>;
}

/// Process environment. Values are returned as-is and never JSON-parsed.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    fn label(&self) -> &'static str {
        "env"
    }

    async fn get_secret(&self, name: &str) -> Result<Option<SecretValue>> {
        Ok(std::env::var(name)
            .ok()
            .filter(|value| !value.is_empty())
            .map(SecretValue::Plain))
    }
}

#[derive(Debug, Default, Clone)]
pub struct StaticSecretProvider {
    values: HashMap<String, SecretValue>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: SecretValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_plain(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, SecretValue::Plain(value.into()))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: SecretValue) {
        self.values.insert(name.into(), value);
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    fn label(&self) -> &'static str {
        "static"
    }

    async fn get_secret(&self, name: &str) -> Result<Option<SecretValue>> {
        Ok(self.values.get(name).cloned())
    }
}

/// Asks each provider in turn and returns the first hit.
#[derive(Default, Clone)]
pub struct ChainedSecretProvider {
    providers: Vec<Arc<dyn SecretProvider>>,
}

impl ChainedSecretProvider {
    pub fn new(providers: Vec<Arc<dyn SecretProvider>>) -> Self {
        Self { providers }
    }

    pub fn push(&mut self, provider: Arc<dyn SecretProvider>) {
        self.providers.push(provider);
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.label()).collect()
    }

    /// Environment first, then Secrets Manager when enabled and AWS credentials are present.
    pub fn from_config(config: &SecretsConfig) -> Result<Self> {
        let mut chain = Self::new(vec![Arc::new(EnvSecretProvider)]);

        if !config.use_secrets_manager {
            info!(target: "secrets", "secrets manager lookup disabled by configuration");
            return Ok(chain);
        }

        match AwsCredentials::from_env() {
            Some(credentials) => {
                let store = SecretsManagerProvider::new(
                    credentials,
                    &config.region,
                    &config.endpoint,
                    config.timeout,
                )?;
                chain.push(Arc::new(store));
            }
            None => {
                info!(
                    target: "secrets",
                    "no AWS credentials in the environment, secrets manager lookup skipped"
                );
            }
        }

        Ok(chain)
    }
}

#[async_trait]
impl SecretProvider for ChainedSecretProvider {
    fn label(&self) -> &'static str {
        "chain"
    }

    async fn get_secret(&self, name: &str) -> Result<Option<SecretValue>> {
        for provider in &self.providers {
            match provider.get_secret(name).await {
                Ok(Some(value)) => {
                    debug!(target: "secrets", secret = name, provider = provider.label(), "secret resolved");
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        target: "secrets",
                        secret = name,
                        provider = provider.label(),
                        error = %err.chain(),
                        "secret lookup failed, trying next provider"
                    );
                }
            }
        }
        Ok(None)
    }
}

pub async fn resolve_secret(provider: &dyn SecretProvider, secret: &SecretRef) -> Result<String> {
    resolve_optional_secret(provider, secret)
        .await?
        .ok_or_else(|| MixerError::MissingSecret(secret.to_string()))
}

pub async fn resolve_optional_secret(
    provider: &dyn SecretProvider,
    secret: &SecretRef,
) -> Result<Option<String>> {
    let value = provider.get_secret(secret.name()).await?;
    Ok(value.and_then(|value| value.extract(secret.field())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingProvider;

    #[async_trait]
    impl SecretProvider for FailingProvider {
        fn label(&self) -> &'static str {
            "failing"
        }

        async fn get_secret(&self, _name: &str) -> Result<Option<SecretValue>> {
            Err(MixerError::from_status("secretsmanager", 500, "unavailable"))
        }
    }

    #[test]
    fn secret_strings_parse_as_json_when_possible() {
        assert_eq!(
            SecretValue::from_secret_string(r#"{"api_key":"abc"}"#),
            SecretValue::Json(json!({ "api_key": "abc" }))
        );
        assert_eq!(
            SecretValue::from_secret_string("AIzaPlainKey"),
            SecretValue::Plain("AIzaPlainKey".to_string())
        );
    }

    #[test]
    fn extract_reads_fields_and_scalars() {
        let json = SecretValue::Json(json!({ "access_key_id": "AKID", "port": 443, "nested": {} }));
        assert_eq!(json.extract(Some("access_key_id")).as_deref(), Some("AKID"));
        assert_eq!(json.extract(Some("port")).as_deref(), Some("443"));
        assert_eq!(json.extract(Some("nested")), None);
        assert_eq!(json.extract(Some("missing")), None);
        assert_eq!(json.extract(None), None);

        assert_eq!(SecretValue::Json(json!("quoted")).extract(None).as_deref(), Some("quoted"));
        assert_eq!(SecretValue::Plain("key".into()).extract(None).as_deref(), Some("key"));
        assert_eq!(SecretValue::Plain("key".into()).extract(Some("api_key")), None);
        assert_eq!(SecretValue::Plain(String::new()).extract(None), None);
    }

    #[test]
    fn secret_ref_parsing() {
        let plain = SecretRef::parse("YOUTUBE_API_KEY");
        assert_eq!(plain.name(), "YOUTUBE_API_KEY");
        assert_eq!(plain.field(), None);

        let field = SecretRef::parse(" mood-mixer/aws#secret_access_key ");
        assert_eq!(field.name(), "mood-mixer/aws");
        assert_eq!(field.field(), Some("secret_access_key"));
        assert_eq!(field.to_string(), "mood-mixer/aws#secret_access_key");

        assert_eq!(SecretRef::parse("name#").field(), None);
    }

    #[tokio::test]
    async fn chain_prefers_earlier_providers_and_skips_failures() {
        let first = StaticSecretProvider::new().with_plain("YOUTUBE_API_KEY", "from-first");
        let second = StaticSecretProvider::new()
            .with_plain("YOUTUBE_API_KEY", "from-second")
            .with_plain("ONLY_SECOND", "second");
        let chain = ChainedSecretProvider::new(vec![
            Arc::new(FailingProvider),
            Arc::new(first),
            Arc::new(second),
        ]);

        let key = resolve_secret(&chain, &SecretRef::parse("YOUTUBE_API_KEY")).await.unwrap();
        assert_eq!(key, "from-first");

        let other = resolve_secret(&chain, &SecretRef::parse("ONLY_SECOND")).await.unwrap();
        assert_eq!(other, "second");

        assert_eq!(chain.labels(), vec!["failing", "static", "static"]);
    }

    #[tokio::test]
    async fn missing_secret_is_a_typed_error() {
        let chain = ChainedSecretProvider::new(vec![Arc::new(StaticSecretProvider::new())]);
        let err = resolve_secret(&chain, &SecretRef::parse("mood-mixer/aws#access_key_id"))
            .await
            .unwrap_err();
        assert!(matches!(err, MixerError::MissingSecret(name) if name == "mood-mixer/aws#access_key_id"));

        let optional = resolve_optional_secret(&chain, &SecretRef::parse("AWS_SESSION_TOKEN"))
            .await
            .unwrap();
        assert_eq!(optional, None);
    }

    #[tokio::test]
    async fn structured_secret_resolves_field() {
        let provider = StaticSecretProvider::new().with(
            "mood-mixer/aws",
            SecretValue::from_secret_string(
                r#"{"access_key_id":"AKID","secret_access_key":"shh"}"#,
            ),
        );
        let secret = resolve_secret(&provider, &SecretRef::parse("mood-mixer/aws#secret_access_key"))
            .await
            .unwrap();
        assert_eq!(secret, "shh");
    }

    #[tokio::test]
    async fn env_provider_ignores_unset_names() {
        let value = EnvSecretProvider
            .get_secret("MOOD_MIXER_TEST_SURELY_UNSET_VARIABLE")
            .await
            .unwrap();
        assert_eq!(value, None);
    }
}
