/// Server management for Hetzner Cloud
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::action::{self, Action};
use super::image::Image;
use super::models::{
    Hydrate, IdOrName, ImageType, ImageWire, RescueType, ResourceIter, ServerStatus, ServerWire,
};
use super::transport::{name_filter, take_key, Transport};
use crate::error::{Error, Result};
use crate::utils::polling::Poller;

/// Default backup window, 02:00 to 06:00 UTC
pub const BACKUP_WINDOW_2AM_6AM: &str = "02-06";

/// Request structure for creating a server
#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub server_type: IdOrName,
    pub image: IdOrName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<IdOrName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<IdOrName>,
    pub start_after_create: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<IdOrName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automount: Option<bool>,
}

impl CreateServerRequest {
    /// Minimal request: the server starts once created
    pub fn new(
        name: impl Into<String>,
        server_type: impl Into<IdOrName>,
        image: impl Into<IdOrName>,
    ) -> Self {
        Self {
            name: name.into(),
            server_type: server_type.into(),
            image: image.into(),
            datacenter: None,
            location: None,
            start_after_create: true,
            ssh_keys: Vec::new(),
            user_data: None,
            volumes: Vec::new(),
            automount: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_argument("name"));
        }
        if self.server_type.is_empty() {
            return Err(Error::invalid_argument("server_type"));
        }
        if self.image.is_empty() {
            return Err(Error::invalid_argument("image"));
        }
        if self.datacenter.is_some() && self.location.is_some() {
            return Err(Error::invalid_argument(
                "datacenter and location are mutually exclusive",
            ));
        }
        if self.automount == Some(true) && self.volumes.is_empty() {
            return Err(Error::invalid_argument(
                "volumes must be set if automount is true",
            ));
        }
        Ok(())
    }
}

/// Server manager for handling Hetzner Cloud servers
///
/// Server-specific calls (deleting, renaming, powering on...) are made on the
/// [`Server`] returned by [`get`](Self::get) or [`get_all`](Self::get_all).
#[derive(Debug, Clone)]
pub struct ServerManager {
    transport: Transport,
}

impl ServerManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create a new server, returning it with the action tracking its provisioning
    pub async fn create(&self, request: CreateServerRequest) -> Result<(Server, Action)> {
        request.validate()?;

        info!(
            "Creating server: {} (type: {}, image: {})",
            request.name, request.server_type, request.image
        );

        let body = serde_json::to_value(&request)?;
        let mut response = self
            .transport
            .expect(Method::POST, "servers", Some(&body), StatusCode::CREATED)
            .await?;

        let action = Action::from_response(&self.transport, &mut response, "action")?;
        let root_password = response["root_password"].as_str().map(str::to_string);
        let wire: ServerWire =
            serde_json::from_value(take_key(response, "server", StatusCode::CREATED)?)?;

        let mut server = Server::hydrate(&self.transport, wire);
        server.root_password = root_password;

        Ok((server, action))
    }

    /// Get a server by ID
    pub async fn get(&self, id: u64) -> Result<Server> {
        self.transport
            .fetch_one(&format!("servers/{}", id), "server", "server", id)
            .await
    }

    /// List all servers, optionally filtered by exact name (no wildcards)
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceIter<Server>> {
        let query = name_filter(name);
        self.transport.list("servers", "servers", &query).await
    }
}

/// A cloud server
#[derive(Debug, Clone)]
pub struct Server {
    transport: Transport,
    pub id: u64,
    pub name: String,
    pub status: ServerStatus,
    pub created: DateTime<Utc>,
    pub public_net_ipv4: Option<String>,
    pub public_net_ipv6: Option<String>,
    pub floating_ips: Vec<u64>,
    pub server_type_id: u64,
    pub datacenter_id: Option<u64>,
    pub image_id: Option<u64>,
    pub iso_id: Option<u64>,
    pub rescue_enabled: bool,
    pub locked: bool,
    pub backup_window: Option<String>,
    pub outgoing_traffic: Option<u64>,
    pub ingoing_traffic: Option<u64>,
    pub included_traffic: Option<u64>,
    pub volumes: Vec<u64>,
    /// Only known right after creation, rebuild or password reset
    pub root_password: Option<String>,
}

impl Hydrate for Server {
    type Wire = ServerWire;

    fn hydrate(transport: &Transport, wire: ServerWire) -> Self {
        if wire.status == ServerStatus::Unknown {
            warn!("Server {} has an unrecognised status", wire.id);
        }
        Self {
            transport: transport.clone(),
            id: wire.id,
            name: wire.name,
            status: wire.status,
            created: wire.created,
            public_net_ipv4: wire.public_net.ipv4.map(|ip| ip.ip),
            public_net_ipv6: wire.public_net.ipv6.map(|ip| ip.ip),
            floating_ips: wire.public_net.floating_ips,
            server_type_id: wire.server_type.id,
            datacenter_id: wire.datacenter.map(|r| r.id),
            image_id: wire.image.map(|r| r.id),
            iso_id: wire.iso.map(|r| r.id),
            rescue_enabled: wire.rescue_enabled,
            locked: wire.locked,
            backup_window: wire.backup_window,
            outgoing_traffic: wire.outgoing_traffic,
            ingoing_traffic: wire.ingoing_traffic,
            included_traffic: wire.included_traffic,
            volumes: wire.volumes,
            root_password: None,
        }
    }
}

impl Server {
    fn endpoint(&self) -> String {
        format!("servers/{}", self.id)
    }

    async fn perform(&self, command: &str, body: Option<Value>) -> Result<(Value, Action)> {
        let endpoint = format!("servers/{}/actions/{}", self.id, command);
        action::perform(&self.transport, &endpoint, body.as_ref()).await
    }

    /// Rename the server. The new name should be DNS compliant.
    pub async fn change_name(&mut self, new_name: &str) -> Result<()> {
        if new_name.is_empty() {
            return Err(Error::invalid_argument("new_name"));
        }

        let body = json!({ "name": new_name });
        self.transport
            .expect(Method::PUT, &self.endpoint(), Some(&body), StatusCode::OK)
            .await?;

        info!("Server {} renamed to {}", self.id, new_name);
        self.name = new_name.to_string();
        Ok(())
    }

    /// Delete the server, making it immediately unavailable
    pub async fn delete(&self) -> Result<Action> {
        let mut response = self
            .transport
            .expect(Method::DELETE, &self.endpoint(), None, StatusCode::OK)
            .await?;

        info!("Server {} deleted", self.id);
        Action::from_response(&self.transport, &mut response, "action")
    }

    /// Start the server
    pub async fn power_on(&self) -> Result<Action> {
        Ok(self.perform("poweron", None).await?.1)
    }

    /// Cut power to the server
    pub async fn power_off(&self) -> Result<Action> {
        Ok(self.perform("poweroff", None).await?.1)
    }

    /// Soft reboot via ACPI
    pub async fn reboot(&self) -> Result<Action> {
        Ok(self.perform("reboot", None).await?.1)
    }

    /// Hard reset
    pub async fn reset(&self) -> Result<Action> {
        Ok(self.perform("reset", None).await?.1)
    }

    /// Graceful shutdown via ACPI
    pub async fn shutdown(&self) -> Result<Action> {
        Ok(self.perform("shutdown", None).await?.1)
    }

    /// Reset the root password, returning the new one
    pub async fn reset_root_password(&mut self) -> Result<(String, Action)> {
        let (response, action) = self.perform("reset_password", None).await?;
        let password = root_password(&response)?;

        self.root_password = Some(password.clone());
        Ok((password, action))
    }

    /// Boot into a rescue system on next reboot.
    ///
    /// This does not reboot the server. SSH keys are only injected into Linux
    /// rescue systems; they are dropped for FreeBSD.
    pub async fn enable_rescue_mode(
        &mut self,
        rescue_type: RescueType,
        ssh_keys: &[u64],
    ) -> Result<(String, Action)> {
        let mut body = json!({ "type": rescue_type });
        if !ssh_keys.is_empty() && rescue_type != RescueType::FreeBsd64 {
            body["ssh_keys"] = json!(ssh_keys);
        }

        let (response, action) = self.perform("enable_rescue", Some(body)).await?;
        let password = root_password(&response)?;

        self.rescue_enabled = true;
        Ok((password, action))
    }

    /// Leave rescue mode on next reboot
    pub async fn disable_rescue_mode(&mut self) -> Result<Action> {
        let (_, action) = self.perform("disable_rescue", None).await?;
        self.rescue_enabled = false;
        Ok(action)
    }

    /// Enable daily backups in the given window, formatted `HH-HH` (e.g. "02-06")
    pub async fn enable_backups(&mut self, backup_window: &str) -> Result<Action> {
        if backup_window.is_empty() {
            return Err(Error::invalid_argument("backup_window"));
        }

        let body = json!({ "backup_window": backup_window });
        let (_, action) = self.perform("enable_backup", Some(body)).await?;

        self.backup_window = Some(backup_window.to_string());
        Ok(action)
    }

    /// Disable backups; existing backups are deleted
    pub async fn disable_backups(&mut self) -> Result<Action> {
        let (_, action) = self.perform("disable_backup", None).await?;
        self.backup_window = None;
        Ok(action)
    }

    /// Attach an ISO by ID; the server boots from it on next reboot
    pub async fn attach_iso(&mut self, iso_id: u64) -> Result<Action> {
        if iso_id == 0 {
            return Err(Error::invalid_argument("iso_id"));
        }

        let (_, action) = self
            .perform("attach_iso", Some(json!({ "iso": iso_id })))
            .await?;
        self.iso_id = Some(iso_id);
        Ok(action)
    }

    /// Detach the attached ISO, if any
    pub async fn detach_iso(&mut self) -> Result<Action> {
        let (_, action) = self.perform("detach_iso", None).await?;
        self.iso_id = None;
        Ok(action)
    }

    /// Change the server type. The server must be powered off.
    pub async fn change_type(&mut self, server_type_id: u64, upgrade_disk: bool) -> Result<Action> {
        if server_type_id == 0 {
            return Err(Error::invalid_argument("server_type_id"));
        }

        let body = json!({ "server_type": server_type_id, "upgrade_disk": upgrade_disk });
        let (_, action) = self.perform("change_type", Some(body)).await?;
        self.server_type_id = server_type_id;
        Ok(action)
    }

    /// Reinstall the server from an image, wiping its disk
    pub async fn rebuild_from_image(&mut self, image_id: u64) -> Result<(Option<String>, Action)> {
        if image_id == 0 {
            return Err(Error::invalid_argument("image_id"));
        }

        let (response, action) = self
            .perform("rebuild", Some(json!({ "image": image_id })))
            .await?;
        let password = response["root_password"].as_str().map(str::to_string);

        self.image_id = Some(image_id);
        if password.is_some() {
            self.root_password = password.clone();
        }
        Ok((password, action))
    }

    /// Snapshot or back up the server's disk into a new image
    pub async fn create_image(
        &self,
        description: Option<&str>,
        image_type: ImageType,
    ) -> Result<(Image, Action)> {
        let mut body = json!({ "type": image_type });
        if let Some(description) = description {
            body["description"] = json!(description);
        }

        let (response, action) = self.perform("create_image", Some(body)).await?;
        let wire: ImageWire =
            serde_json::from_value(take_key(response, "image", StatusCode::CREATED)?)?;
        Ok((Image::hydrate(&self.transport, wire), action))
    }

    /// Set (or with `None`, reset) the reverse DNS entry of one of the server's IPs
    pub async fn change_reverse_dns_entry(&self, ip: &str, dns_ptr: Option<&str>) -> Result<Action> {
        if ip.is_empty() {
            return Err(Error::invalid_argument("ip"));
        }

        let body = json!({ "ip": ip, "dns_ptr": dns_ptr });
        Ok(self.perform("change_dns_ptr", Some(body)).await?.1)
    }

    /// Wait until the server reports `status`, with the default poller
    pub async fn wait_until_status_is(&mut self, status: ServerStatus) -> Result<()> {
        self.wait_until_status_is_with(status, &Poller::default())
            .await
    }

    /// Wait until the server reports `status`
    pub async fn wait_until_status_is_with(
        &mut self,
        status: ServerStatus,
        poller: &Poller,
    ) -> Result<()> {
        let transport = self.transport.clone();
        let id = self.id;
        poller
            .wait_until_eq(&mut self.status, status, || {
                let transport = transport.clone();
                async move {
                    let value = transport
                        .fetch_json(&format!("servers/{}", id), "server", "server", id)
                        .await?;
                    Ok::<ServerStatus, Error>(serde_json::from_value(value["status"].clone())?)
                }
            })
            .await
    }
}

fn root_password(response: &Value) -> Result<String> {
    response["root_password"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::action(None, response.clone()))
}
