//! Async client for the Hetzner Cloud API.
//!
//! ```no_run
//! use hetznercloud::{Configuration, HetznerCloudClient};
//! use hetznercloud::hcloud::models::ActionStatus;
//!
//! # async fn run() -> hetznercloud::Result<()> {
//! let client = HetznerCloudClient::new(Configuration::from_env()?)?;
//! let mut volume = client.volumes().get(4711).await?;
//! let mut action = volume.attach_to_server(42).await?;
//! action.wait_until_status_is(ActionStatus::Success).await?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod hcloud;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::Configuration;
pub use error::{Error, Result};
pub use hcloud::models;
pub use hcloud::HetznerCloudClient;
pub use utils::polling::Poller;
