#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use axum::Router;

use storefront_api::config::AppConfig;
use storefront_api::gateway::{Gateway, MemoryBackend};
use storefront_api::{app, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "longenough1";

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register `email` with the shared test password; returns the `data` object
    pub async fn register(&self, email: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "first_name": "A",
                "last_name": "B",
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no token")
    }

    /// Register and log in a fresh account, returning its bearer token
    pub async fn signed_in(&self, email: &str) -> Result<String> {
        self.register(email).await?;
        self.login(email).await
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SUPABASE_URL", "http://127.0.0.1:9"),
        ("SUPABASE_KEY", "public-key"),
        ("SUPABASE_SERVICE_KEY", "service-key"),
        ("JWT_SECRET", JWT_SECRET),
        ("JWT_EXPIRY", "1h"),
        ("ENV", "test"),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration is complete")
}

/// Serve `router` on an unused local port
pub async fn serve(router: Router) -> Result<TestServer> {
    init_tracing();

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    })
}

/// Serve the full router over `gateway`
pub async fn spawn_with_gateway(gateway: Gateway) -> Result<TestServer> {
    serve(app(AppState::new(test_config(), gateway))).await
}

/// Serve the full router over a fresh in-memory backend
pub async fn spawn_app() -> Result<(TestServer, MemoryBackend)> {
    let backend = MemoryBackend::new();
    let server = spawn_with_gateway(Gateway::in_memory(backend.clone())).await?;
    Ok((server, backend))
}
