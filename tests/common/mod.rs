#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::task::JoinHandle;

use research_portal::analytics::{ActiveRule, Aggregator};
use research_portal::config::{AppConfig, SecurityConfig};
use research_portal::routes::{app, AppState};
use research_portal::store::{MemoryStore, ResearchStore};

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve `fixtures/sample.json` with auth disabled.
    pub async fn open() -> Result<Self> {
        Self::spawn(security(false)).await
    }

    /// Serve `fixtures/sample.json` with bearer tokens required.
    pub async fn secured() -> Result<Self> {
        Self::spawn(security(true)).await
    }

    async fn spawn(security: SecurityConfig) -> Result<Self> {
        let store: Arc<dyn ResearchStore> = Arc::new(MemoryStore::load(&fixture_path()).await?);
        let aggregator = Aggregator::new(store.clone(), ActiveRule::default());
        let state = AppState::new(store, aggregator, security);
        let router = app(state, &AppConfig::development().api);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            handle,
        })
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.get(format!("{}{}", self.base_url, path))).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.get(format!("{}{}", self.base_url, path)).bearer_auth(token))
            .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, Value)> {
        let res = request.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.context("response body is not JSON")?;
        Ok((status, body))
    }

    /// GET and unwrap the success envelope.
    pub async fn data(&self, path: &str) -> Result<Value> {
        let (status, body) = self.get(path).await?;
        anyhow::ensure!(status == StatusCode::OK, "GET {} returned {}: {}", path, status, body);
        anyhow::ensure!(body["success"] == Value::Bool(true), "missing success envelope: {}", body);
        Ok(body["data"].clone())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join("sample.json")
}

fn security(require_auth: bool) -> SecurityConfig {
    SecurityConfig {
        enable_cors: false,
        cors_origins: Vec::new(),
        require_auth,
        jwt_secret: JWT_SECRET.to_string(),
    }
}
