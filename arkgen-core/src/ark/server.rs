//! Ark server parameters: the `/v1/info` REST call and a per-URL cache.

use crate::crypto::parse_x_only_hex;
use crate::error::{ArkgenError, Result};
use async_trait::async_trait;
use bitcoin::secp256k1::XOnlyPublicKey;
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// The subset of the server's info response needed to build addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub signer_pubkey: String,
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub unilateral_exit_delay: u64,
    #[serde(default)]
    pub network: String,
}

impl ServerInfo {
    pub fn signer_x_only(&self) -> Result<XOnlyPublicKey> {
        parse_x_only_hex(&self.signer_pubkey).map_err(|e| {
            ArkgenError::InvalidServerResponse(format!("signerPubkey: {}", e))
        })
    }

    pub fn ark_hrp(&self) -> &'static str {
        super::address::ark_hrp(&self.network)
    }
}

/// The REST gateway renders int64 fields as strings.
fn u64_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[async_trait]
pub trait ServerInfoProvider: Send + Sync {
    async fn fetch_info(&self, server_url: &str) -> Result<ServerInfo>;
}

#[derive(Debug, Clone)]
pub struct RestServerInfoProvider {
    client: reqwest::Client,
}

impl RestServerInfoProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArkgenError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ServerInfoProvider for RestServerInfoProvider {
    async fn fetch_info(&self, server_url: &str) -> Result<ServerInfo> {
        let url = format!("{}/v1/info", normalize_url(server_url));
        tracing::info!(url = %url, "Fetching Ark server info");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArkgenError::server_fetch(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        let body = response.text().await?;
        let info: ServerInfo = serde_json::from_str(&body)
            .map_err(|e| ArkgenError::InvalidServerResponse(e.to_string()))?;
        info.signer_x_only()?;

        tracing::debug!(
            signer = %info.signer_pubkey,
            exit_delay = info.unilateral_exit_delay,
            network = %info.network,
            "Received Ark server info"
        );
        Ok(info)
    }
}

/// Memoizes [`ServerInfo`] per server URL. Concurrent callers for the same
/// URL share one request; failures are not stored, so the next call
/// retries.
pub struct ServerInfoCache<P> {
    inner: P,
    entries: Mutex<HashMap<String, Arc<OnceCell<ServerInfo>>>>,
}

impl<P: ServerInfoProvider> ServerInfoCache<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of URLs with a cached value.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate(&self, server_url: &str) {
        self.entries.lock().remove(&normalize_url(server_url));
    }

    pub async fn get(&self, server_url: &str) -> Result<ServerInfo> {
        let key = normalize_url(server_url);
        let cell = {
            let mut entries = self.entries.lock();
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(info) = cell.get() {
            tracing::debug!(url = %key, "Server info cache hit");
            return Ok(info.clone());
        }

        let info = cell
            .get_or_try_init(|| async {
                let info = self.inner.fetch_info(&key).await?;
                tracing::info!(url = %key, "Cached Ark server info");
                Ok::<_, ArkgenError>(info)
            })
            .await?;
        Ok(info.clone())
    }
}

#[async_trait]
impl<P: ServerInfoProvider> ServerInfoProvider for ServerInfoCache<P> {
    async fn fetch_info(&self, server_url: &str) -> Result<ServerInfo> {
        self.get(server_url).await
    }
}
