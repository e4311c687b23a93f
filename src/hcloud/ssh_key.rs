/// SSH key management for Hetzner Cloud
use reqwest::{Method, StatusCode};
use serde_json::json;
use tracing::info;

use super::models::{Hydrate, ResourceIter, SshKeyWire};
use super::transport::{name_filter, take_key, Transport};
use crate::error::{Error, Result};

/// SSH key manager for handling Hetzner Cloud SSH keys
#[derive(Debug, Clone)]
pub struct SshKeyManager {
    transport: Transport,
}

impl SshKeyManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Upload a public key under `name`
    pub async fn create(&self, name: &str, public_key: &str) -> Result<SshKey> {
        if name.is_empty() {
            return Err(Error::invalid_argument("name"));
        }
        if public_key.is_empty() {
            return Err(Error::invalid_argument("public_key"));
        }

        info!("Creating SSH key: {}", name);

        let body = json!({ "name": name, "public_key": public_key });
        let response = self
            .transport
            .expect(Method::POST, "ssh_keys", Some(&body), StatusCode::CREATED)
            .await?;

        let wire: SshKeyWire =
            serde_json::from_value(take_key(response, "ssh_key", StatusCode::CREATED)?)?;
        Ok(SshKey::hydrate(&self.transport, wire))
    }

    /// Get an SSH key by ID
    pub async fn get(&self, id: u64) -> Result<SshKey> {
        self.transport
            .fetch_one(&format!("ssh_keys/{}", id), "ssh_key", "ssh_key", id)
            .await
    }

    /// List all SSH keys, optionally filtered by exact name
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceIter<SshKey>> {
        let query = name_filter(name);
        self.transport.list("ssh_keys", "ssh_keys", &query).await
    }
}

/// A public key that can be injected into new servers
#[derive(Debug, Clone)]
pub struct SshKey {
    transport: Transport,
    pub id: u64,
    pub name: String,
    pub fingerprint: String,
    pub public_key: String,
}

impl Hydrate for SshKey {
    type Wire = SshKeyWire;

    fn hydrate(transport: &Transport, wire: SshKeyWire) -> Self {
        Self {
            transport: transport.clone(),
            id: wire.id,
            name: wire.name,
            fingerprint: wire.fingerprint,
            public_key: wire.public_key,
        }
    }
}

impl SshKey {
    fn endpoint(&self) -> String {
        format!("ssh_keys/{}", self.id)
    }

    /// Rename the key
    pub async fn update(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_argument("name"));
        }

        let body = json!({ "name": name });
        self.transport
            .expect(Method::PUT, &self.endpoint(), Some(&body), StatusCode::OK)
            .await?;

        self.name = name.to_string();
        Ok(())
    }

    /// Delete the key
    pub async fn delete(&self) -> Result<()> {
        self.transport
            .expect(Method::DELETE, &self.endpoint(), None, StatusCode::NO_CONTENT)
            .await?;

        info!("SSH key {} deleted", self.name);
        Ok(())
    }
}
