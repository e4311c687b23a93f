/// Datacenters (read-only)
use super::location::Location;
use super::models::{DatacenterWire, Hydrate, ResourceIter};
use super::transport::{name_filter, Transport};
use crate::error::Result;

/// A datacenter within a location
#[derive(Debug, Clone)]
pub struct Datacenter {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub location: Location,
    /// Server type IDs this datacenter can run
    pub supported_server_types: Vec<u64>,
    /// Server type IDs that can currently be ordered here
    pub available_server_types: Vec<u64>,
}

impl Hydrate for Datacenter {
    type Wire = DatacenterWire;

    fn hydrate(transport: &Transport, wire: DatacenterWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            location: Location::hydrate(transport, wire.location),
            supported_server_types: wire.server_types.supported,
            available_server_types: wire.server_types.available,
        }
    }
}

impl Datacenter {
    /// Whether a server of the given type can be created here right now
    pub fn is_server_type_available(&self, server_type_id: u64) -> bool {
        self.available_server_types.contains(&server_type_id)
    }
}

#[derive(Debug, Clone)]
pub struct DatacenterManager {
    transport: Transport,
}

impl DatacenterManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Get a datacenter by ID
    pub async fn get(&self, id: u64) -> Result<Datacenter> {
        self.transport
            .fetch_one(&format!("datacenters/{}", id), "datacenter", "datacenter", id)
            .await
    }

    /// List all datacenters, optionally filtered by exact name
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceIter<Datacenter>> {
        let query = name_filter(name);
        self.transport.list("datacenters", "datacenters", &query).await
    }
}
