/// Hetzner Cloud API client implementation
pub mod action;
pub mod client;
pub mod datacenter;
pub mod floating_ip;
pub mod image;
pub mod iso;
pub mod location;
pub mod models;
pub mod server;
pub mod server_type;
pub mod ssh_key;
pub mod transport;
pub mod volume;

pub use action::{Action, ActionManager};
pub use client::HetznerCloudClient;
pub use datacenter::{Datacenter, DatacenterManager};
pub use floating_ip::{CreateFloatingIpRequest, FloatingIp, FloatingIpManager};
pub use image::{Image, ImageFilter, ImageManager};
pub use iso::{Iso, IsoManager};
pub use location::{Location, LocationManager};
pub use server::{CreateServerRequest, Server, ServerManager};
pub use server_type::{ServerType, ServerTypeManager};
pub use ssh_key::{SshKey, SshKeyManager};
pub use volume::{CreateVolumeRequest, Volume, VolumeManager};
