//! multipeer CLI — inspect configuration and exercise the session layer.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use multipeer_session::{setup, Commander, Config, PeerRef, Session, SessionEvent};
use multipeer_transport::{LoopbackHub, MultipeerTransport};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "multipeer",
    about = "Peer discovery and session state for local peer-to-peer networks",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run two sessions over an in-process loopback hub and print the
    /// normalized event stream.
    Demo {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<String>,

        /// Discovery channel, overriding the configured one.
        #[arg(long)]
        channel: Option<String>,
    },

    /// Print the effective configuration as TOML.
    Config {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { config, channel } => {
            let mut config = setup::load_config(config.as_deref())?;
            if let Some(channel) = channel {
                config.session.channel = channel;
            }
            run_demo(config).await?;
        }
        Commands::Config { config } => {
            let config = setup::load_config(config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Run a local session and a scripted remote peer over one loopback hub.
///
/// The remote browses, invites us on discovery, sends a greeting once
/// connected, and leaves; we advertise, accept the invite, and print every
/// normalized event as it arrives.
async fn run_demo(config: Config) -> anyhow::Result<()> {
    let channel = config.session.channel.clone();
    let hub = LoopbackHub::new();

    let (local_endpoint, local_notifications) = hub.attach(&config.identity.name);
    let (remote_endpoint, remote_notifications) = hub.attach("demo-peer");

    let (local_session, mut local_events) = Session::new(&config, local_notifications);
    let (remote_session, mut remote_events) = Session::new(&config, remote_notifications);

    let local_shutdown = local_session.shutdown_handle();
    let remote_shutdown = remote_session.shutdown_handle();
    let local_handle = tokio::spawn(local_session.run());
    let remote_handle = tokio::spawn(remote_session.run());

    let local_transport: Arc<dyn MultipeerTransport> = Arc::new(local_endpoint);
    let local_commander = Commander::new(local_transport);
    let remote_endpoint = Arc::new(remote_endpoint);
    let remote_transport: Arc<dyn MultipeerTransport> = remote_endpoint.clone();
    let remote_commander = Commander::new(remote_transport);

    local_commander
        .advertise(&channel, &config.identity.name)
        .await?;
    remote_commander.browse(&channel).await?;

    // Script the remote: invite on discovery, greet once connected, leave.
    let remote_script = tokio::spawn(async move {
        while let Some(event) = remote_events.recv().await {
            match event {
                SessionEvent::PeerFound { peer } => {
                    info!(target: "demo-peer", peer = %peer, "found, inviting");
                    let _ = remote_commander.invite(PeerRef::from(peer)).await;
                }
                SessionEvent::PeerConnected { peer } => {
                    info!(target: "demo-peer", peer = %peer, "connected, greeting");
                    let _ = remote_commander
                        .send(vec![PeerRef::from(peer)], b"hello from demo-peer".to_vec())
                        .await;
                    remote_endpoint.detach().await;
                    break;
                }
                _ => {}
            }
        }
    });

    // Our side: print the normalized stream, accept the invite, stop once
    // the remote is gone.
    while let Some(event) = local_events.recv().await {
        match event {
            SessionEvent::PeerFound { peer } => info!(peer = %peer, "peer found"),
            SessionEvent::PeerConnecting { peer } => info!(peer = %peer, "peer connecting"),
            SessionEvent::PeerConnected { peer } => info!(peer = %peer, "peer connected"),
            SessionEvent::PeerDisconnected { peer } => info!(peer = %peer, "peer disconnected"),
            SessionEvent::StreamOpened { peer } => info!(peer = %peer, "stream opened"),
            SessionEvent::InviteReceived { peer, invite } => {
                info!(peer = %peer, invite = %invite, "invite received, accepting");
                local_commander.rsvp(invite, true).await?;
            }
            SessionEvent::DataReceived { peer, data } => {
                info!(peer = %peer, data = %String::from_utf8_lossy(&data), "data received");
            }
            SessionEvent::PeerLost { peer } => {
                info!(peer = %peer, "peer lost, demo complete");
                break;
            }
        }
    }

    remote_script.await?;
    local_shutdown.shutdown().await;
    remote_shutdown.shutdown().await;
    let _ = local_handle.await;
    let _ = remote_handle.await;
    Ok(())
}
