/// Image management for Hetzner Cloud
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::models::{Hydrate, ImageStatus, ImageType, ImageWire, ResourceIter};
use super::transport::Transport;
use crate::error::{Error, Result};

/// Query filters for listing images; unset fields are not sent
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    /// Sort order, e.g. `id:asc` or `name:desc`
    pub sort: Option<String>,
    pub image_type: Option<ImageType>,
    /// Only backups bound to this server
    pub bound_to: Option<u64>,
    pub name: Option<String>,
}

impl ImageFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("per_page", "100".to_string())];
        if let Some(sort) = &self.sort {
            query.push(("sort", sort.clone()));
        }
        if let Some(image_type) = &self.image_type {
            query.push(("type", image_type.as_str().to_string()));
        }
        if let Some(bound_to) = self.bound_to {
            query.push(("bound_to", bound_to.to_string()));
        }
        if let Some(name) = &self.name {
            query.push(("name", name.clone()));
        }
        query
    }
}

/// Image manager for handling Hetzner Cloud images
#[derive(Debug, Clone)]
pub struct ImageManager {
    transport: Transport,
}

impl ImageManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Get an image by ID
    pub async fn get(&self, id: u64) -> Result<Image> {
        self.transport
            .fetch_one(&format!("images/{}", id), "image", "image", id)
            .await
    }

    /// List images (first 100) matching `filter`
    pub async fn get_all(&self, filter: &ImageFilter) -> Result<ResourceIter<Image>> {
        self.transport
            .list("images", "images", &filter.to_query())
            .await
    }
}

/// A system image, snapshot or backup
#[derive(Debug, Clone)]
pub struct Image {
    transport: Transport,
    pub id: u64,
    pub image_type: ImageType,
    pub status: ImageStatus,
    pub name: Option<String>,
    pub description: String,
    /// Compressed size in GB; only set for snapshots and backups
    pub image_size: Option<f64>,
    pub disk_size: Option<f64>,
    pub created_from_id: Option<u64>,
    pub created_from_name: Option<String>,
    pub bound_to: Option<u64>,
    pub os_flavor: Option<String>,
    pub os_version: Option<String>,
    pub rapid_deploy: bool,
}

impl Hydrate for Image {
    type Wire = ImageWire;

    fn hydrate(transport: &Transport, wire: ImageWire) -> Self {
        if wire.status == ImageStatus::Unknown {
            warn!("Image {} has an unrecognised status", wire.id);
        }
        let (created_from_id, created_from_name) = match wire.created_from {
            Some(origin) => (Some(origin.id), Some(origin.name)),
            None => (None, None),
        };
        Self {
            transport: transport.clone(),
            id: wire.id,
            image_type: wire.image_type,
            status: wire.status,
            name: wire.name,
            description: wire.description,
            image_size: wire.image_size,
            disk_size: wire.disk_size,
            created_from_id,
            created_from_name,
            bound_to: wire.bound_to,
            os_flavor: wire.os_flavor,
            os_version: wire.os_version,
            rapid_deploy: wire.rapid_deploy,
        }
    }
}

impl Image {
    fn endpoint(&self) -> String {
        format!("images/{}", self.id)
    }

    /// Change the description and/or type; fields passed as `None` are left alone.
    ///
    /// Only snapshots and backups can be updated, and a backup can only be
    /// converted into a snapshot.
    pub async fn update(
        &mut self,
        description: Option<&str>,
        image_type: Option<ImageType>,
    ) -> Result<()> {
        if description.is_none() && image_type.is_none() {
            return Err(Error::invalid_argument(
                "description or image_type must be set",
            ));
        }

        let mut body = Map::new();
        if let Some(description) = description {
            body.insert("description".into(), Value::from(description));
        }
        if let Some(image_type) = &image_type {
            body.insert("type".into(), Value::from(image_type.as_str()));
        }

        self.transport
            .expect(
                Method::PUT,
                &self.endpoint(),
                Some(&Value::Object(body)),
                StatusCode::OK,
            )
            .await?;

        if let Some(description) = description {
            self.description = description.to_string();
        }
        if let Some(image_type) = image_type {
            self.image_type = image_type;
        }
        Ok(())
    }

    /// Delete the image. System images cannot be deleted.
    pub async fn delete(&self) -> Result<()> {
        self.transport
            .expect(Method::DELETE, &self.endpoint(), None, StatusCode::NO_CONTENT)
            .await?;

        info!("Image {} deleted", self.id);
        Ok(())
    }
}
