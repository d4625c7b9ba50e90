use anyhow::{Context, Result, bail};
use beacon::PeerId;
use beacon::client::{
    ChannelEvent, ClientCommand, ClientConfig, ClientController, ClientEvent, ConnectionStatus,
    LocalIdentity, NoMedia, PeerConfig, SignallingChannel, WebRtcFactory, WsSignallingChannel,
};
use beacon::model::{ClientMessage, DirectoryEntry, DirectorySnapshot, ServerMessage};
use beacon::server::{DEFAULT_COALESCE_LIMIT, ServerConfig, serve};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Select;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "ws://127.0.0.1:3001/ws";
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "beacon", version, about = "Peer rendezvous and signalling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rendezvous server.
    Serve {
        #[arg(long, env = "BEACON_ADDR", default_value = "0.0.0.0:3001")]
        addr: SocketAddr,

        /// Queued commands folded into one directory broadcast.
        #[arg(long, default_value_t = DEFAULT_COALESCE_LIMIT)]
        coalesce_limit: usize,
    },

    /// Drop every advertised room.
    Clear {
        #[arg(long, env = "BEACON_URL", default_value = DEFAULT_URL)]
        url: String,
    },

    /// List advertised rooms.
    Peers {
        #[arg(long, env = "BEACON_URL", default_value = DEFAULT_URL)]
        url: String,
    },

    /// Advertise a room and wait for someone to join it.
    Offer {
        #[arg(long, env = "BEACON_URL", default_value = DEFAULT_URL)]
        url: String,

        #[arg(long, default_value = "anonymous")]
        alias: String,

        /// ICE server URL; repeatable. Defaults to a public STUN server.
        #[arg(long = "ice")]
        ice_servers: Vec<String>,

        /// Seconds a joining peer gets to finish connecting.
        #[arg(long, default_value_t = 30)]
        handshake_timeout: u64,
    },

    /// Pick an advertised room and join it.
    Answer {
        #[arg(long, env = "BEACON_URL", default_value = DEFAULT_URL)]
        url: String,

        #[arg(long, default_value = "anonymous")]
        alias: String,

        #[arg(long = "ice")]
        ice_servers: Vec<String>,

        /// Seconds to wait for the room's owner to connect.
        #[arg(long, default_value_t = 30)]
        handshake_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            addr,
            coalesce_limit,
        } => {
            println!("{}", format!("📡 Beacon listening on {}", addr).green().bold());
            let config = ServerConfig {
                coalesce_limit,
                ..ServerConfig::with_addr(addr)
            };
            serve(config, shutdown_signal()).await?;
            println!("{}", "👋 Server stopped".cyan());
        }

        Commands::Clear { url } => {
            let (channel, mut events) = WsSignallingChannel::connect(&url)
                .await
                .with_context(|| format!("Failed to connect to {}", url))?;

            next_directory(&mut events).await?;
            channel.send(ClientMessage::ClearRooms).await?;
            next_directory(&mut events).await?;
            channel.close().await;

            println!("{}", "🧹 Directory cleared".green().bold());
        }

        Commands::Peers { url } => {
            let (channel, mut events) = WsSignallingChannel::connect(&url)
                .await
                .with_context(|| format!("Failed to connect to {}", url))?;

            let snapshot = next_directory(&mut events).await?;
            channel.close().await;

            print_directory(&snapshot);
        }

        Commands::Offer {
            url,
            alias,
            ice_servers,
            handshake_timeout,
        } => {
            let mut session = Session::start(&url, alias, ice_servers, handshake_timeout).await?;
            session
                .wait_for(|event| {
                    matches!(event, ClientEvent::StatusChanged(ConnectionStatus::Connected))
                        .then_some(())
                })
                .await?;

            session.command(ClientCommand::CreateRoom).await?;
            println!("{}", "🚀 Creating room...".cyan());
            session.follow().await?;
        }

        Commands::Answer {
            url,
            alias,
            ice_servers,
            handshake_timeout,
        } => {
            let mut session = Session::start(&url, alias, ice_servers, handshake_timeout).await?;
            let snapshot = session
                .wait_for(|event| match event {
                    ClientEvent::DirectoryUpdated(snapshot) => Some(snapshot),
                    _ => None,
                })
                .await?;

            let own_id = session.id.clone();
            let rooms: Vec<DirectoryEntry> = snapshot
                .into_iter()
                .filter(|entry| entry.id != own_id)
                .collect();
            if rooms.is_empty() {
                session.command(ClientCommand::Shutdown).await?;
                bail!("No rooms advertised on {}", url);
            }

            let labels: Vec<String> = rooms
                .iter()
                .map(|entry| format!("{} ({})", entry.alias, entry.id))
                .collect();
            let choice = tokio::task::spawn_blocking(move || {
                Select::new()
                    .with_prompt("Join which room?")
                    .items(&labels)
                    .default(0)
                    .interact()
            })
            .await??;

            let target = rooms[choice].id.clone();
            println!("{}", format!("🔗 Joining {}...", target).cyan());
            session.command(ClientCommand::ConnectTo(target)).await?;
            session.follow().await?;
        }
    }

    Ok(())
}

/// A client controller running on its own task.
struct Session {
    id: PeerId,
    commands: mpsc::Sender<ClientCommand>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    task: JoinHandle<()>,
}

impl Session {
    async fn start(
        url: &str,
        alias: String,
        ice_servers: Vec<String>,
        handshake_timeout: u64,
    ) -> Result<Self> {
        let (channel, channel_events) = WsSignallingChannel::connect(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        let peer_config = if ice_servers.is_empty() {
            PeerConfig::default()
        } else {
            PeerConfig { ice_servers }
        };

        let identity = LocalIdentity::new(alias);
        let id = identity.id.clone();
        let (controller, events) = ClientController::new(
            identity,
            Arc::new(channel),
            Arc::new(WebRtcFactory::new(peer_config)),
            Arc::new(NoMedia),
        );
        let controller = controller.with_config(ClientConfig {
            handshake_timeout: Duration::from_secs(handshake_timeout),
        });

        let (commands, command_rx) = mpsc::channel(16);
        let task = tokio::spawn(controller.run(channel_events, command_rx));

        Ok(Self {
            id,
            commands,
            events,
            task,
        })
    }

    async fn command(&self, command: ClientCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .context("Client stopped")
    }

    /// Skip events until `pick` accepts one.
    async fn wait_for<T>(&mut self, mut pick: impl FnMut(ClientEvent) -> Option<T>) -> Result<T> {
        loop {
            let event = tokio::time::timeout(REPLY_TIMEOUT, self.events.recv())
                .await
                .context("Timed out waiting for the server")?
                .context("Client stopped")?;

            if let Some(picked) = pick(event) {
                return Ok(picked);
            }
        }
    }

    /// Report events until ctrl-c, then shut the client down.
    async fn follow(mut self) -> Result<()> {
        println!("{}", "Press ctrl-c to leave.".dimmed());

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => report(&event),
                    None => break,
                },
                _ = shutdown_signal() => break,
            }
        }

        let _ = self.commands.send(ClientCommand::Shutdown).await;
        self.task.await.context("Client task panicked")?;
        println!("{}", "👋 Bye".cyan());
        Ok(())
    }
}

fn report(event: &ClientEvent) {
    match event {
        ClientEvent::OfferRegistered(_) => {
            println!("{}", "📢 Room advertised, waiting for a peer...".green())
        }
        ClientEvent::AnswerSent { remote, .. } => {
            println!("{}", format!("✉️  Answer sent to {}", remote).cyan())
        }
        ClientEvent::StreamReady { remote, stream, .. } => {
            let peer = remote
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "peer".to_owned());
            println!(
                "{}",
                format!("✨ Connected to {} ({})", peer, stream.label())
                    .green()
                    .bold()
            );
        }
        ClientEvent::AttemptFailed { reason, .. } => {
            println!("{}", format!("❌ Connection failed: {}", reason).red().bold())
        }
        ClientEvent::CaptureFailed(reason) => {
            println!("{}", format!("⚠️  No local media: {}", reason).yellow())
        }
        ClientEvent::Rejected(reason) => {
            println!("{}", format!("⚠️  Server rejected a message: {}", reason).yellow())
        }
        ClientEvent::CommandFailed(reason) => println!("{}", format!("❌ {}", reason).red()),
        ClientEvent::StatusChanged(ConnectionStatus::Disconnected) => {
            println!("{}", "⚠️  Signalling server went away".yellow())
        }
        ClientEvent::StatusChanged(_) | ClientEvent::DirectoryUpdated(_) => {}
    }
}

async fn next_directory(
    events: &mut mpsc::UnboundedReceiver<ChannelEvent>,
) -> Result<DirectorySnapshot> {
    loop {
        let event = tokio::time::timeout(REPLY_TIMEOUT, events.recv())
            .await
            .context("Timed out waiting for the directory")?;

        match event {
            Some(ChannelEvent::Message(ServerMessage::Clients(snapshot))) => return Ok(snapshot),
            Some(ChannelEvent::Message(ServerMessage::Rejected { reason })) => {
                bail!("Server rejected the request: {}", reason)
            }
            Some(ChannelEvent::Disconnected) | None => bail!("Server closed the connection"),
            Some(_) => {}
        }
    }
}

fn print_directory(snapshot: &DirectorySnapshot) {
    if snapshot.is_empty() {
        println!("{}", "No rooms advertised.".dimmed());
        return;
    }

    println!("{}", format!("📋 {} room(s):", snapshot.len()).bold());
    for entry in snapshot.iter() {
        println!("   {} {}", entry.alias.green(), entry.id.to_string().dimmed());
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
    }
}
