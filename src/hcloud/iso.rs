/// ISO images that can be mounted into a server (read-only)
use super::models::{Hydrate, IsoType, IsoWire, ResourceIter};
use super::transport::Transport;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Iso {
    pub id: u64,
    pub name: Option<String>,
    pub description: String,
    pub iso_type: IsoType,
}

impl Hydrate for Iso {
    type Wire = IsoWire;

    fn hydrate(_transport: &Transport, wire: IsoWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            iso_type: wire.iso_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsoManager {
    transport: Transport,
}

impl IsoManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Get an ISO by ID
    pub async fn get(&self, id: u64) -> Result<Iso> {
        self.transport
            .fetch_one(&format!("isos/{}", id), "iso", "iso", id)
            .await
    }

    /// List ISOs (first 100), optionally filtered by exact name
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceIter<Iso>> {
        let mut query = vec![("per_page", "100".to_string())];
        if let Some(name) = name {
            query.push(("name", name.to_string()));
        }
        self.transport.list("isos", "isos", &query).await
    }
}
