/// Locations (read-only)
use super::models::{Hydrate, LocationWire, ResourceIter};
use super::transport::{name_filter, Transport};
use crate::error::Result;

/// A physical site hosting one or more datacenters
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Hydrate for Location {
    type Wire = LocationWire;

    fn hydrate(_transport: &Transport, wire: LocationWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            country: wire.country,
            city: wire.city,
            latitude: wire.latitude,
            longitude: wire.longitude,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationManager {
    transport: Transport,
}

impl LocationManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Get a location by ID
    pub async fn get(&self, id: u64) -> Result<Location> {
        self.transport
            .fetch_one(&format!("locations/{}", id), "location", "location", id)
            .await
    }

    /// List all locations, optionally filtered by exact name
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceIter<Location>> {
        let query = name_filter(name);
        self.transport.list("locations", "locations", &query).await
    }
}
