/// Volume management for Hetzner Cloud
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::action::{self, Action};
use super::location::Location;
use super::models::{Hydrate, IdOrName, ResourceIter, VolumeFormat, VolumeStatus, VolumeWire};
use super::transport::{name_filter, take_key, Transport};
use crate::error::{Error, Result};
use crate::utils::polling::Poller;

/// Smallest volume the API will create, in GB
pub const VOLUME_MINIMUM_SIZE: u64 = 10;

/// Request structure for creating a volume
#[derive(Debug, Clone, Serialize)]
pub struct CreateVolumeRequest {
    pub name: String,
    pub size: u64,
    pub automount: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<VolumeFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<IdOrName>,
    #[serde(rename = "server", skip_serializing_if = "Option::is_none")]
    pub server_id: Option<u64>,
}

impl CreateVolumeRequest {
    /// Request a volume of `size` GB; set either `location` or `server_id` before sending
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            automount: false,
            format: None,
            location: None,
            server_id: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_argument("name"));
        }
        if self.size < VOLUME_MINIMUM_SIZE {
            return Err(Error::invalid_argument(format!(
                "size ({}) has to be at least VOLUME_MINIMUM_SIZE ({})",
                self.size, VOLUME_MINIMUM_SIZE
            )));
        }
        if self.location.is_none() && self.server_id.is_none() {
            return Err(Error::invalid_argument("location or server_id must be set"));
        }
        if self.automount && self.server_id.is_none() {
            return Err(Error::invalid_argument(
                "server_id must be set if automount is true",
            ));
        }
        if matches!(self.format, Some(VolumeFormat::Unknown)) {
            return Err(Error::invalid_argument("invalid format"));
        }
        Ok(())
    }
}

/// Volume manager for handling Hetzner Cloud volumes
#[derive(Debug, Clone)]
pub struct VolumeManager {
    transport: Transport,
}

impl VolumeManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create a volume, returning it with the action tracking its creation
    pub async fn create(&self, request: CreateVolumeRequest) -> Result<(Volume, Action)> {
        request.validate()?;

        info!("Creating volume: {} ({} GB)", request.name, request.size);

        let body = serde_json::to_value(&request)?;
        let mut response = self
            .transport
            .expect(Method::POST, "volumes", Some(&body), StatusCode::CREATED)
            .await?;

        let action = Action::from_response(&self.transport, &mut response, "action")?;
        let wire: VolumeWire =
            serde_json::from_value(take_key(response, "volume", StatusCode::CREATED)?)?;
        Ok((Volume::hydrate(&self.transport, wire), action))
    }

    /// Get a volume by ID
    pub async fn get(&self, id: u64) -> Result<Volume> {
        self.transport
            .fetch_one(&format!("volumes/{}", id), "volume", "volume", id)
            .await
    }

    /// List all volumes, optionally filtered by exact name
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceIter<Volume>> {
        let query = name_filter(name);
        self.transport.list("volumes", "volumes", &query).await
    }
}

/// A block storage volume
#[derive(Debug, Clone)]
pub struct Volume {
    transport: Transport,
    pub id: u64,
    pub created: DateTime<Utc>,
    pub name: String,
    /// Server the volume is attached to
    pub server_id: Option<u64>,
    pub location: Location,
    pub size: u64,
    pub linux_device: Option<String>,
    pub status: VolumeStatus,
    pub format: Option<VolumeFormat>,
}

impl Hydrate for Volume {
    type Wire = VolumeWire;

    fn hydrate(transport: &Transport, wire: VolumeWire) -> Self {
        if wire.status == VolumeStatus::Unknown {
            warn!("Volume {} has an unrecognised status", wire.id);
        }
        Self {
            transport: transport.clone(),
            id: wire.id,
            created: wire.created,
            name: wire.name,
            server_id: wire.server,
            location: Location::hydrate(transport, wire.location),
            size: wire.size,
            linux_device: wire.linux_device,
            status: wire.status,
            format: wire.format,
        }
    }
}

impl Volume {
    fn endpoint(&self) -> String {
        format!("volumes/{}", self.id)
    }

    /// Attach the volume to a server in the same location
    pub async fn attach_to_server(&mut self, server_id: u64) -> Result<Action> {
        if server_id == 0 {
            return Err(Error::invalid_argument("server_id"));
        }

        let endpoint = format!("volumes/{}/actions/attach", self.id);
        let body = json!({ "server": server_id });
        let (_, action) = action::perform(&self.transport, &endpoint, Some(&body)).await?;

        info!("Volume {} attaching to server {}", self.id, server_id);
        self.server_id = Some(server_id);
        Ok(action)
    }

    /// Detach the volume from its server
    pub async fn detach_from_server(&mut self) -> Result<Action> {
        let endpoint = format!("volumes/{}/actions/detach", self.id);
        let (_, action) = action::perform(&self.transport, &endpoint, None).await?;

        info!("Volume {} detaching", self.id);
        self.server_id = None;
        Ok(action)
    }

    /// Grow the volume to `size` GB; volumes cannot shrink
    pub async fn resize(&mut self, size: u64) -> Result<Action> {
        if size == 0 {
            return Err(Error::invalid_argument("size not set"));
        }
        if size <= self.size {
            return Err(Error::invalid_argument(format!(
                "new size ({}) has to be greater than the current size ({})",
                size, self.size
            )));
        }

        let endpoint = format!("volumes/{}/actions/resize", self.id);
        let body = json!({ "size": size });
        let (_, action) = action::perform(&self.transport, &endpoint, Some(&body)).await?;

        self.size = size;
        Ok(action)
    }

    /// Rename the volume
    pub async fn change_name(&mut self, new_name: &str) -> Result<()> {
        if new_name.is_empty() {
            return Err(Error::invalid_argument("new_name"));
        }

        let body = json!({ "name": new_name });
        self.transport
            .expect(Method::PUT, &self.endpoint(), Some(&body), StatusCode::OK)
            .await?;

        self.name = new_name.to_string();
        Ok(())
    }

    /// Delete the volume. It must be detached first.
    pub async fn delete(&self) -> Result<()> {
        self.transport
            .expect(Method::DELETE, &self.endpoint(), None, StatusCode::NO_CONTENT)
            .await?;

        info!("Volume {} deleted", self.id);
        Ok(())
    }

    /// Wait until the volume reports `status`, with the default poller
    pub async fn wait_until_status_is(&mut self, status: VolumeStatus) -> Result<()> {
        self.wait_until_status_is_with(status, &Poller::default())
            .await
    }

    /// Wait until the volume reports `status`
    pub async fn wait_until_status_is_with(
        &mut self,
        status: VolumeStatus,
        poller: &Poller,
    ) -> Result<()> {
        let transport = self.transport.clone();
        let id = self.id;
        poller
            .wait_until_eq(&mut self.status, status, || {
                let transport = transport.clone();
                async move {
                    let value = fetch_volume(&transport, id).await?;
                    Ok::<VolumeStatus, Error>(serde_json::from_value(value["status"].clone())?)
                }
            })
            .await
    }

    /// Wait until the volume is attached to `server_id` (or detached, for `None`), with the default poller
    pub async fn wait_until_server_is(&mut self, server_id: Option<u64>) -> Result<()> {
        self.wait_until_server_is_with(server_id, &Poller::default())
            .await
    }

    /// Wait until the volume is attached to `server_id` (or detached, for `None`)
    pub async fn wait_until_server_is_with(
        &mut self,
        server_id: Option<u64>,
        poller: &Poller,
    ) -> Result<()> {
        let transport = self.transport.clone();
        let id = self.id;
        poller
            .wait_until_eq(&mut self.server_id, server_id, || {
                let transport = transport.clone();
                async move {
                    let value = fetch_volume(&transport, id).await?;
                    Ok::<Option<u64>, Error>(serde_json::from_value(value["server"].clone())?)
                }
            })
            .await
    }
}

async fn fetch_volume(transport: &Transport, id: u64) -> Result<serde_json::Value> {
    transport
        .fetch_json(&format!("volumes/{}", id), "volume", "volume", id)
        .await
}
