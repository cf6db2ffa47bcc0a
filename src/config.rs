use std::{
    env, fs,
    net::SocketAddr,
    path::Path,
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

use crate::secrets::SecretRef;

const DEFAULT_CONFIG_PATH: &str = "config/app_config.toml";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";
const DEFAULT_MAX_TOKENS: u32 = 30;
const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

#[derive(Clone, Debug)]
pub struct BedrockConfig {
    pub region: String,
    pub model_id: String,
    pub max_tokens: u32,
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct YoutubeConfig {
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct SecretsConfig {
    pub region: String,
    pub endpoint: String,
    pub use_secrets_manager: bool,
    pub timeout: Duration,
    pub aws_access_key_id: SecretRef,
    pub aws_secret_access_key: SecretRef,
    pub aws_session_token: Option<SecretRef>,
    pub youtube_api_key: SecretRef,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bedrock: BedrockConfig,
    pub youtube: YoutubeConfig,
    pub secrets: SecretsConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Reads `$APP_CONFIG_PATH` (or `config/app_config.toml`). A missing file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            env::var("APP_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(config_path)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = path.as_ref();
        if !config_path.exists() {
            tracing::info!(target: "config", path = ?config_path, "config file not found, using defaults");
            return Self::from_toml_str("");
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file {:?}", config_path))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to parse config file {:?}", config_path))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let file_config: FileConfig = toml::from_str(contents)?;

        let bedrock = file_config.bedrock.unwrap_or_default().into_domain();
        let youtube = file_config.youtube.unwrap_or_default().into_domain();
        let secrets = file_config.secrets.unwrap_or_default().into_domain();
        let server = file_config.server.unwrap_or_default().into_domain()?;

        Ok(Self {
            bedrock,
            youtube,
            secrets,
            server,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    bedrock: Option<FileBedrockConfig>,
    #[serde(default)]
    youtube: Option<FileYoutubeConfig>,
    #[serde(default)]
    secrets: Option<FileSecretsConfig>,
    #[serde(default)]
    server: Option<FileServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct FileBedrockConfig {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    model_id: Option<String>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl FileBedrockConfig {
    fn into_domain(self) -> BedrockConfig {
        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| format!("https://bedrock-runtime.{region}.amazonaws.com"));

        BedrockConfig {
            model_id: self
                .model_id
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS).max(1),
            endpoint,
            timeout: timeout(self.timeout_seconds),
            region,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileYoutubeConfig {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl FileYoutubeConfig {
    fn into_domain(self) -> YoutubeConfig {
        YoutubeConfig {
            api_url: self
                .api_url
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_URL.to_string()),
            timeout: timeout(self.timeout_seconds),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileSecretsConfig {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    use_secrets_manager: Option<bool>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
    #[serde(default)]
    aws_access_key_id: Option<String>,
    #[serde(default)]
    aws_secret_access_key: Option<String>,
    #[serde(default)]
    aws_session_token: Option<String>,
    #[serde(default)]
    youtube_api_key: Option<String>,
}

impl FileSecretsConfig {
    fn into_domain(self) -> SecretsConfig {
        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| format!("https://secretsmanager.{region}.amazonaws.com"));

        // An explicitly empty session token reference turns the lookup off.
        let aws_session_token = match self.aws_session_token {
            Some(name) if name.trim().is_empty() => None,
            Some(name) => Some(SecretRef::parse(&name)),
            None => Some(SecretRef::parse("AWS_SESSION_TOKEN")),
        };

        SecretsConfig {
            endpoint,
            use_secrets_manager: self.use_secrets_manager.unwrap_or(true),
            timeout: timeout(self.timeout_seconds),
            aws_access_key_id: secret_ref(self.aws_access_key_id, "AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: secret_ref(self.aws_secret_access_key, "AWS_SECRET_ACCESS_KEY"),
            aws_session_token,
            youtube_api_key: secret_ref(self.youtube_api_key, "YOUTUBE_API_KEY"),
            region,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileServerConfig {
    #[serde(default)]
    bind_addr: Option<String>,
}

impl FileServerConfig {
    fn into_domain(self) -> anyhow::Result<ServerConfig> {
        let bind_addr_str = self
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .with_context(|| format!("failed to parse server.bind_addr: {}", bind_addr_str))?;

        Ok(ServerConfig { bind_addr })
    }
}

fn timeout(seconds: Option<u64>) -> Duration {
    Duration::from_secs(seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS).max(1))
}

fn secret_ref(value: Option<String>, default_name: &str) -> SecretRef {
    match value {
        Some(name) if !name.trim().is_empty() => SecretRef::parse(&name),
        _ => SecretRef::parse(default_name),
    }
}
