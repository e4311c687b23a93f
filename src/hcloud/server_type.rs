/// Server types (read-only)
use super::models::{Hydrate, ResourceIter, ServerTypeWire};
use super::transport::{name_filter, Transport};
use crate::error::Result;

/// Hardware profile a server can be created with
#[derive(Debug, Clone, PartialEq)]
pub struct ServerType {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub cores: u32,
    /// Memory in GB
    pub memory: f64,
    /// Disk size in GB
    pub disk: u64,
    pub storage_type: String,
}

impl Hydrate for ServerType {
    type Wire = ServerTypeWire;

    fn hydrate(_transport: &Transport, wire: ServerTypeWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            cores: wire.cores,
            memory: wire.memory,
            disk: wire.disk,
            storage_type: wire.storage_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerTypeManager {
    transport: Transport,
}

impl ServerTypeManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Get a server type by ID
    pub async fn get(&self, id: u64) -> Result<ServerType> {
        self.transport
            .fetch_one(&format!("server_types/{}", id), "server_type", "server_type", id)
            .await
    }

    /// List all server types, optionally filtered by exact name
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceIter<ServerType>> {
        let query = name_filter(name);
        self.transport.list("server_types", "server_types", &query).await
    }
}
