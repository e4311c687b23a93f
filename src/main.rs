/// hcloud - inspect Hetzner Cloud resources from the command line
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hetznercloud::hcloud::image::ImageFilter;
use hetznercloud::models::ActionStatus;
use hetznercloud::{Configuration, HetznerCloudClient, Poller};

#[derive(Parser)]
#[command(name = "hcloud")]
#[command(about = "Query Hetzner Cloud resources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to HCLOUD_TOKEN from the environment)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List resources of one kind
    List {
        resource: Resource,

        /// Only show resources with exactly this name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show a single resource
    Get { resource: Resource, id: u64 },

    /// Wait for an action to finish
    WaitAction {
        id: u64,

        /// Number of status checks, one second apart
        #[arg(long, default_value_t = hetznercloud::utils::polling::DEFAULT_ATTEMPTS)]
        attempts: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Actions,
    Datacenters,
    FloatingIps,
    Images,
    Isos,
    Locations,
    Servers,
    ServerTypes,
    SshKeys,
    Volumes,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hetznercloud={0},hcloud={0}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::List {
            resource,
            ref name,
        } => list_resources(&cli, resource, name.as_deref()).await,
        Commands::Get { resource, id } => get_resource(&cli, resource, id).await,
        Commands::WaitAction { id, attempts } => wait_action(&cli, id, attempts).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn build_client(cli: &Cli) -> Result<HetznerCloudClient> {
    let config = match &cli.config {
        Some(path) => Configuration::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Configuration::from_env().context("Failed to load configuration")?,
    };

    HetznerCloudClient::new(config).context("Failed to create Hetzner Cloud client")
}

/// List every resource of the requested kind, one per line
async fn list_resources(cli: &Cli, resource: Resource, name: Option<&str>) -> Result<()> {
    let client = build_client(cli)?;

    match resource {
        Resource::Actions => {
            for action in client.actions().get_all(None).await? {
                info!("{:>10}  {:<24} {} ({}%)", action.id, action.command, action.status, action.progress);
            }
        }
        Resource::Datacenters => {
            for dc in client.datacenters().get_all(name).await? {
                info!("{:>10}  {:<12} {}", dc.id, dc.name, dc.description);
            }
        }
        Resource::FloatingIps => {
            for ip in client.floating_ips().get_all().await? {
                let server = ip.server_id.map_or_else(|| "-".to_string(), |id| id.to_string());
                info!("{:>10}  {:<20} {} server={}", ip.id, ip.ip, ip.ip_type, server);
            }
        }
        Resource::Images => {
            let filter = ImageFilter {
                name: name.map(str::to_string),
                ..Default::default()
            };
            for image in client.images().get_all(&filter).await? {
                info!(
                    "{:>10}  {:<24} {} {}",
                    image.id,
                    image.name.as_deref().unwrap_or("-"),
                    image.image_type,
                    image.description
                );
            }
        }
        Resource::Isos => {
            for iso in client.isos().get_all(name).await? {
                info!("{:>10}  {:<40} {}", iso.id, iso.name.as_deref().unwrap_or("-"), iso.description);
            }
        }
        Resource::Locations => {
            for location in client.locations().get_all(name).await? {
                info!("{:>10}  {:<8} {}, {}", location.id, location.name, location.city, location.country);
            }
        }
        Resource::Servers => {
            for server in client.servers().get_all(name).await? {
                let ip = server.public_net_ipv4.as_deref().unwrap_or("N/A");
                info!("{:>10}  {:<24} {:<12} {}", server.id, server.name, server.status, ip);
            }
        }
        Resource::ServerTypes => {
            for server_type in client.server_types().get_all(name).await? {
                info!(
                    "{:>10}  {:<8} {} cores, {} GB RAM, {} GB disk",
                    server_type.id, server_type.name, server_type.cores, server_type.memory, server_type.disk
                );
            }
        }
        Resource::SshKeys => {
            for key in client.ssh_keys().get_all(name).await? {
                info!("{:>10}  {:<24} {}", key.id, key.name, key.fingerprint);
            }
        }
        Resource::Volumes => {
            for volume in client.volumes().get_all(name).await? {
                let server = volume.server_id.map_or_else(|| "-".to_string(), |id| id.to_string());
                info!(
                    "{:>10}  {:<24} {} GB {} server={}",
                    volume.id, volume.name, volume.size, volume.status, server
                );
            }
        }
    }

    Ok(())
}

/// Show one resource in detail
async fn get_resource(cli: &Cli, resource: Resource, id: u64) -> Result<()> {
    let client = build_client(cli)?;

    match resource {
        Resource::Actions => info!("{:#?}", client.actions().get(id).await?),
        Resource::Datacenters => info!("{:#?}", client.datacenters().get(id).await?),
        Resource::FloatingIps => info!("{:#?}", client.floating_ips().get(id).await?),
        Resource::Images => info!("{:#?}", client.images().get(id).await?),
        Resource::Isos => info!("{:#?}", client.isos().get(id).await?),
        Resource::Locations => info!("{:#?}", client.locations().get(id).await?),
        Resource::Servers => info!("{:#?}", client.servers().get(id).await?),
        Resource::ServerTypes => info!("{:#?}", client.server_types().get(id).await?),
        Resource::SshKeys => info!("{:#?}", client.ssh_keys().get(id).await?),
        Resource::Volumes => info!("{:#?}", client.volumes().get(id).await?),
    }

    Ok(())
}

/// Block until an action succeeds, fails, or the attempt budget runs out
async fn wait_action(cli: &Cli, id: u64, attempts: u32) -> Result<()> {
    let client = build_client(cli)?;

    let mut action = client
        .actions()
        .get(id)
        .await
        .with_context(|| format!("Failed to fetch action {}", id))?;

    info!("Waiting for action {} ({})...", action.id, action.command);

    let poller = Poller::new(attempts, hetznercloud::utils::polling::DEFAULT_WAIT_SECONDS);
    action
        .wait_until_status_is_with(ActionStatus::Success, &poller)
        .await
        .with_context(|| format!("Action {} did not succeed", id))?;

    info!("✓ Action {} finished", action.id);
    Ok(())
}
