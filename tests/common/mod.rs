#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use farmbazaar_api::chat::{ChatBackend, ChatError};
use farmbazaar_api::config::AppConfig;
use farmbazaar_api::{app, AppState};

/// One router served in-process on a free port, with its own store and
/// upload directory. Dropped together with the test's runtime.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    uploads: TempDir,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(None).await
    }

    pub async fn with_chat(backend: Arc<dyn ChatBackend>) -> Result<Self> {
        Self::start_with(Some(backend)).await
    }

    async fn start_with(backend: Option<Arc<dyn ChatBackend>>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let uploads = tempfile::tempdir().context("failed to create upload dir")?;

        let mut config = AppConfig::development();
        config.uploads.dir = uploads.path().to_path_buf();
        config.chat.api_key = None;

        let mut state = AppState::in_memory(config)?;
        if let Some(backend) = backend {
            state = state.with_chat_backend(backend);
        }
        state.uploads.ensure_dir().await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app(state)).await {
                eprintln!("test server stopped: {}", e);
            }
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            uploads,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Number of files currently stored by the upload intake.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).map(|dir| dir.count()).unwrap_or(0)
    }

    /// Signs up a fresh account and returns its token.
    pub async fn signup(&self, email: &str, role: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.api("/auth/signup"))
            .json(&json!({
                "name": "Test User",
                "email": email,
                "password": "password123",
                "role": role,
            }))
            .send()
            .await?;
        anyhow::ensure!(resp.status() == StatusCode::CREATED, "signup failed: {}", resp.status());

        let body: Value = resp.json().await?;
        body["token"].as_str().map(str::to_string).context("signup response has no token")
    }
}

/// Text fields of a complete listing.
pub fn listing_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("cropName", "Wheat"),
        ("cropVariety", "Sharbati"),
        ("cropCategory", "Cereals"),
        ("quantity", "1200"),
        ("quantityUnit", "kg"),
        ("expectedYieldDate", "2025-04-15"),
        ("address", "Plot 7, Canal Road"),
        ("state", "Madhya Pradesh"),
        ("district", "Sehore"),
        ("village", "Ichhawar"),
        ("pinCode", "466115"),
        ("farmArea", "3.5"),
        ("expectedPrice", "2600"),
        ("minPrice", "2400"),
        ("paymentMode", "Bank Transfer"),
        ("preferredBuyerType", "Wholesaler"),
        ("contractDuration", "6 months"),
        ("deliveryResponsibility", "Farmer"),
        ("deliveryLocation", "Sehore Mandi"),
    ]
}

pub fn file_part(name: &str, mime: &str, bytes: &[u8]) -> Result<Part> {
    Ok(Part::bytes(bytes.to_vec()).file_name(name.to_string()).mime_str(mime)?)
}

/// A listing form without files, minus the fields in `skip`.
pub fn listing_form_without(skip: &[&str]) -> Form {
    listing_fields()
        .into_iter()
        .filter(|(name, _)| !skip.contains(name))
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}

/// A complete listing form with one image and an ID proof.
pub fn listing_form() -> Result<Form> {
    Ok(listing_form_without(&[])
        .part("images", file_part("field.jpg", "image/jpeg", b"\xFF\xD8\xFFfake-jpeg")?)
        .part("idProof", file_part("aadhaar.pdf", "application/pdf", b"%PDF-1.4 fake")?))
}

/// Creates a listing as `token` and returns the stored document.
pub async fn create_listing(server: &TestServer, token: &str) -> Result<Value> {
    let resp = server
        .client
        .post(server.api("/contracts"))
        .bearer_auth(token)
        .multipart(listing_form()?)
        .send()
        .await?;
    anyhow::ensure!(resp.status() == StatusCode::CREATED, "create failed: {}", resp.status());

    let body: Value = resp.json().await?;
    Ok(body["contract"].clone())
}

pub const CANNED_REPLY: &str = "Sow after the first monsoon rains.";

/// Answers every prompt with [`CANNED_REPLY`].
pub struct CannedBackend;

#[async_trait]
impl ChatBackend for CannedBackend {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        Ok(CANNED_REPLY.to_string())
    }
}

/// Always fails as an unreachable upstream would.
pub struct FailingBackend;

#[async_trait]
impl ChatBackend for FailingBackend {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        Err(ChatError::Upstream("connection refused".to_string()))
    }
}
