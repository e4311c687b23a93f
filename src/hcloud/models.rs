/// Hetzner Cloud API data models
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

use super::transport::Transport;

/// Builds a local entity from its wire representation.
///
/// There is exactly one implementation per entity kind, and every call site
/// returning that kind goes through it.
pub trait Hydrate: Sized {
    /// Shape of one record as the API returns it
    type Wire: DeserializeOwned;

    /// Map the wire record to the local entity
    fn hydrate(transport: &Transport, wire: Self::Wire) -> Self;
}

/// Lazy sequence of entities returned by `get_all`.
///
/// Records are hydrated one by one as the iterator advances, in the order the
/// API returned them. The sequence is consumed by iteration and cannot be restarted.
pub struct ResourceIter<T: Hydrate> {
    transport: Transport,
    wires: std::vec::IntoIter<T::Wire>,
    _marker: PhantomData<T>,
}

impl<T: Hydrate> ResourceIter<T> {
    pub(crate) fn new(transport: Transport, wires: Vec<T::Wire>) -> Self {
        Self {
            transport,
            wires: wires.into_iter(),
            _marker: PhantomData,
        }
    }
}

impl<T: Hydrate> Iterator for ResourceIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.wires
            .next()
            .map(|wire| T::hydrate(&self.transport, wire))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.wires.size_hint()
    }
}

impl<T: Hydrate> ExactSizeIterator for ResourceIter<T> {}

impl<T: Hydrate> fmt::Debug for ResourceIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceIter")
            .field("remaining", &self.wires.len())
            .finish()
    }
}

/// Reference to a resource by numeric ID or by name.
///
/// The API accepts either form wherever a server type, image, location,
/// datacenter or ISO is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdOrName {
    Id(u64),
    Name(String),
}

impl IdOrName {
    /// True for an empty name or the zero ID
    pub fn is_empty(&self) -> bool {
        match self {
            IdOrName::Id(id) => *id == 0,
            IdOrName::Name(name) => name.is_empty(),
        }
    }
}

impl From<u64> for IdOrName {
    fn from(id: u64) -> Self {
        IdOrName::Id(id)
    }
}

impl From<&str> for IdOrName {
    fn from(name: &str) -> Self {
        IdOrName::Name(name.to_string())
    }
}

impl From<String> for IdOrName {
    fn from(name: String) -> Self {
        IdOrName::Name(name)
    }
}

impl fmt::Display for IdOrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdOrName::Id(id) => write!(f, "{}", id),
            IdOrName::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Declares a provider status enum with a lowercase wire form and an `Unknown` fallback.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
            #[serde(other)]
            Unknown,
        }

        impl $name {
            /// Wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => "unknown",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// Status of an asynchronous action
    ActionStatus {
        Running => "running",
        Success => "success",
        Error => "error",
    }
);

wire_enum!(
    /// Power/lifecycle status of a server
    ServerStatus {
        Running => "running",
        Initializing => "initializing",
        Starting => "starting",
        Stopping => "stopping",
        Off => "off",
        Deleting => "deleting",
        Migrating => "migrating",
        Rebuilding => "rebuilding",
    }
);

wire_enum!(
    /// Status of a volume
    VolumeStatus {
        Creating => "creating",
        Available => "available",
    }
);

wire_enum!(
    /// Status of an image
    ImageStatus {
        Available => "available",
        Creating => "creating",
    }
);

wire_enum!(
    /// Kind of image
    ImageType {
        System => "system",
        Snapshot => "snapshot",
        Backup => "backup",
    }
);

wire_enum!(
    /// Kind of ISO
    IsoType {
        Public => "public",
        Private => "private",
    }
);

wire_enum!(
    /// Address family of a floating IP
    FloatingIpType {
        Ipv4 => "ipv4",
        Ipv6 => "ipv6",
    }
);

wire_enum!(
    /// Rescue system flavour
    RescueType {
        Linux64 => "linux64",
        Linux32 => "linux32",
        FreeBsd64 => "freebsd64",
    }
);

wire_enum!(
    /// Filesystem a new volume is formatted with
    VolumeFormat {
        Xfs => "xfs",
        Ext4 => "ext4",
    }
);

/// Reference to another resource, as nested inside a payload
#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: u64,
}

/// Action as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct ActionWire {
    pub id: u64,
    pub command: String,
    pub status: ActionStatus,
    pub progress: u32,
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub error: Option<ActionErrorDetail>,
    #[serde(default)]
    pub resources: Vec<ActionResource>,
}

/// Error embedded in a failed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionErrorDetail {
    pub code: String,
    pub message: String,
}

/// Resource touched by an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResource {
    pub id: u64,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Server as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct ServerWire {
    pub id: u64,
    pub name: String,
    pub status: ServerStatus,
    pub created: DateTime<Utc>,
    pub public_net: PublicNetwork,
    pub server_type: IdRef,
    pub datacenter: Option<IdRef>,
    pub image: Option<IdRef>,
    pub iso: Option<IdRef>,
    #[serde(default)]
    pub rescue_enabled: bool,
    #[serde(default)]
    pub locked: bool,
    pub backup_window: Option<String>,
    pub outgoing_traffic: Option<u64>,
    pub ingoing_traffic: Option<u64>,
    pub included_traffic: Option<u64>,
    #[serde(default)]
    pub volumes: Vec<u64>,
}

/// Public network configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicNetwork {
    pub ipv4: Option<IpAddress>,
    pub ipv6: Option<IpAddress>,
    #[serde(default)]
    pub floating_ips: Vec<u64>,
}

/// IP address information
#[derive(Debug, Clone, Deserialize)]
pub struct IpAddress {
    pub ip: String,
    #[serde(default)]
    pub blocked: bool,
}

/// Volume as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeWire {
    pub id: u64,
    pub created: DateTime<Utc>,
    pub name: String,
    pub server: Option<u64>,
    pub location: LocationWire,
    pub size: u64,
    pub linux_device: Option<String>,
    pub status: VolumeStatus,
    pub format: Option<VolumeFormat>,
}

/// Floating IP as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct FloatingIpWire {
    pub id: u64,
    pub description: Option<String>,
    pub ip: String,
    #[serde(rename = "type")]
    pub ip_type: FloatingIpType,
    pub server: Option<u64>,
    #[serde(default)]
    pub dns_ptr: Vec<DnsPtr>,
    pub home_location: Option<IdRef>,
    #[serde(default)]
    pub blocked: bool,
}

/// Reverse DNS entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsPtr {
    pub ip: String,
    pub dns_ptr: Option<String>,
}

/// SSH key as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct SshKeyWire {
    pub id: u64,
    pub name: String,
    pub fingerprint: String,
    pub public_key: String,
}

/// Image as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct ImageWire {
    pub id: u64,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    pub status: ImageStatus,
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub image_size: Option<f64>,
    pub disk_size: Option<f64>,
    pub created_from: Option<CreatedFrom>,
    pub bound_to: Option<u64>,
    pub os_flavor: Option<String>,
    pub os_version: Option<String>,
    #[serde(default)]
    pub rapid_deploy: bool,
}

/// Server an image was created from
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedFrom {
    pub id: u64,
    pub name: String,
}

/// ISO as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct IsoWire {
    pub id: u64,
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub iso_type: IsoType,
}

/// Location as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct LocationWire {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Datacenter as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct DatacenterWire {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub location: LocationWire,
    pub server_types: DatacenterServerTypes,
}

/// Server types supported and currently available in a datacenter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatacenterServerTypes {
    #[serde(default)]
    pub supported: Vec<u64>,
    #[serde(default)]
    pub available: Vec<u64>,
}

/// Server type as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct ServerTypeWire {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub cores: u32,
    pub memory: f64,
    pub disk: u64,
    pub storage_type: String,
}
