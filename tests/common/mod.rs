//! Mock upstream services for integration tests.
//!
//! Each mock is a real axum server on an ephemeral port that records every
//! request and answers with whatever the test's responder returns.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
};
use mood_mixer::{
    auth::AwsCredentials,
    capabilities::{GenreClassifier, SongFinder},
    config::AppConfig,
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot};

pub const ACCESS_KEY_ID: &str = "AKIDTESTEXAMPLE";
pub const SECRET_ACCESS_KEY: &str = "test/secret/key";
pub const YOUTUBE_KEY: &str = "yt-test-key";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

type Responder = Arc<dyn Fn(&CapturedRequest) -> (StatusCode, String) + Send + Sync>;

#[derive(Clone)]
struct MockState {
    responder: Responder,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub struct MockProvider {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockProvider {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&CapturedRequest) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            responder: Arc::new(responder),
            captured: captured.clone(),
        };

        let app = Router::new().fallback(capture).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            captured,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Always answers with the same status and JSON body.
    pub async fn fixed(status: StatusCode, body: Value) -> Self {
        let body = body.to_string();
        Self::start(move |_| (status, body.clone())).await
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn capture(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let url = reqwest::Url::parse(&format!("http://mock{uri}")).unwrap();
    let request = CapturedRequest {
        method,
        path: uri.path().to_string(),
        query: url.query_pairs().into_owned().collect(),
        headers,
        body,
    };

    let (status, body) = (state.responder)(&request);
    state.captured.lock().unwrap().push(request);

    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

/// Base url of a port that nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn config_for(bedrock_url: &str, youtube_url: &str) -> AppConfig {
    AppConfig::from_toml_str(&format!(
        r#"
        [bedrock]
        region = "us-east-1"
        endpoint = "{bedrock_url}"
        timeout_seconds = 5

        [youtube]
        api_url = "{youtube_url}/youtube/v3"
        timeout_seconds = 5

        [secrets]
        use_secrets_manager = false
        "#
    ))
    .unwrap()
}

pub fn credentials() -> AwsCredentials {
    AwsCredentials::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY, None)
}

pub fn classifier(bedrock_url: &str) -> GenreClassifier {
    let config = config_for(bedrock_url, "http://127.0.0.1:9");
    GenreClassifier::new(&config.bedrock, credentials()).unwrap()
}

pub fn finder(youtube_url: &str) -> SongFinder {
    let config = config_for("http://127.0.0.1:9", youtube_url);
    SongFinder::new(&config.youtube, YOUTUBE_KEY).unwrap()
}

pub fn bedrock_text(text: &str) -> Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-haiku-20240307",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 21, "output_tokens": 4 },
    })
}

pub fn youtube_item(video_id: &str, title: &str) -> Value {
    json!({
        "kind": "youtube#searchResult",
        "id": { "kind": "youtube#video", "videoId": video_id },
        "snippet": {
            "title": title,
            "channelTitle": "Some Channel",
            "thumbnails": {
                "default": { "url": format!("https://i.ytimg.com/vi/{video_id}/default.jpg") },
                "medium": { "url": format!("https://i.ytimg.com/vi/{video_id}/mqdefault.jpg") },
                "high": { "url": format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg") },
            },
        },
    })
}

pub fn youtube_page(items: Vec<Value>) -> Value {
    json!({
        "kind": "youtube#searchListResponse",
        "pageInfo": { "totalResults": items.len(), "resultsPerPage": 10 },
        "items": items,
    })
}
