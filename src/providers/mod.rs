pub mod bedrock;
pub mod youtube;

use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::errors::Result;

const USER_AGENT: &str = concat!("MoodMixer/", env!("CARGO_PKG_VERSION"));

/// Every provider owns its client; none are shared across components.
pub(crate) fn http_client(timeout: Duration) -> Result<HttpClient> {
    Ok(HttpClient::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}
