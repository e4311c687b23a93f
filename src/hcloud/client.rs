/// Hetzner Cloud API client
use tracing::debug;

use super::action::ActionManager;
use super::datacenter::DatacenterManager;
use super::floating_ip::FloatingIpManager;
use super::image::ImageManager;
use super::iso::IsoManager;
use super::location::LocationManager;
use super::server::ServerManager;
use super::server_type::ServerTypeManager;
use super::ssh_key::SshKeyManager;
use super::transport::Transport;
use super::volume::VolumeManager;
use crate::config::Configuration;
use crate::error::Result;

/// Main Hetzner Cloud API client.
///
/// Cheap to clone. Every manager handed out shares the same HTTP connection
/// pool and configuration.
#[derive(Debug, Clone)]
pub struct HetznerCloudClient {
    transport: Transport,
}

impl HetznerCloudClient {
    /// Create a new client, validating the configuration before any request is made
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        debug!("Using Hetzner Cloud API at {}", config.base_url());

        let transport = Transport::new(config)?;
        Ok(Self { transport })
    }

    pub fn configuration(&self) -> &Configuration {
        self.transport.configuration()
    }

    pub fn actions(&self) -> ActionManager {
        ActionManager::new(self.transport.clone())
    }

    pub fn datacenters(&self) -> DatacenterManager {
        DatacenterManager::new(self.transport.clone())
    }

    pub fn floating_ips(&self) -> FloatingIpManager {
        FloatingIpManager::new(self.transport.clone())
    }

    pub fn images(&self) -> ImageManager {
        ImageManager::new(self.transport.clone())
    }

    pub fn isos(&self) -> IsoManager {
        IsoManager::new(self.transport.clone())
    }

    pub fn locations(&self) -> LocationManager {
        LocationManager::new(self.transport.clone())
    }

    pub fn server_types(&self) -> ServerTypeManager {
        ServerTypeManager::new(self.transport.clone())
    }

    pub fn servers(&self) -> ServerManager {
        ServerManager::new(self.transport.clone())
    }

    pub fn ssh_keys(&self) -> SshKeyManager {
        SshKeyManager::new(self.transport.clone())
    }

    pub fn volumes(&self) -> VolumeManager {
        VolumeManager::new(self.transport.clone())
    }
}
