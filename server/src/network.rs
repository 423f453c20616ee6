//! UDP bridge between the game engine and the mine router
//!
//! The engine-side shim says `Hello`, then streams its events one packet
//! at a time. Each event is folded into the roster, routed, and every
//! command it produced is sent straight back. A periodic tick retires
//! resolved mines even while no events arrive.

use crate::config::MineConfig;
use crate::host::{Host, Ruleset};
use crate::minefield::MineField;
use crate::roster::RemoteHost;
use crate::router::EventRouter;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{HostCommand, HostEvent, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::interval;

pub type BridgeError = Box<dyn std::error::Error + Send + Sync>;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
}

/// Serves one engine at a time
pub struct Server {
    socket: Arc<UdpSocket>,
    config: MineConfig,
    router: EventRouter,
    host: Option<RemoteHost>,
    peer: Option<SocketAddr>,
    tick_duration: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(addr: &str, tick_duration: Duration, config: MineConfig) -> Result<Self, BridgeError> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Mine bridge listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let router = fresh_router(&config);

        Ok(Server {
            socket,
            config,
            router,
            host: None,
            peer: None,
            tick_duration,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.socket.local_addr()?)
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 4096];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) = server_tx.send(ServerMessage::PacketReceived { packet, addr }) {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    async fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        let result = match serialize(packet) {
            Ok(data) => self.socket.send_to(&data, addr).await.map(|_| ()).map_err(BridgeError::from),
            Err(e) => Err(BridgeError::from(e)),
        };
        if let Err(e) = result {
            error!("Failed to send packet to {}: {}", addr, e);
        }
    }

    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Hello {
                protocol_version,
                shock_radius,
                free_for_all,
            } => {
                if protocol_version != PROTOCOL_VERSION {
                    let reason = format!("Unsupported protocol version {protocol_version}");
                    self.send_packet(&Packet::Rejected { reason }, addr).await;
                    return;
                }
                if self.peer.is_some_and(|peer| peer != addr) {
                    let reason = "Bridge is already serving another engine".to_string();
                    self.send_packet(&Packet::Rejected { reason }, addr).await;
                    return;
                }

                info!(
                    "Engine at {} connected (shock radius {}, free for all: {})",
                    addr, shock_radius, free_for_all
                );
                let ruleset = if free_for_all {
                    Ruleset::FreeForAll
                } else {
                    Ruleset::Teams
                };
                self.host = Some(RemoteHost::new(shock_radius, ruleset));
                self.router = fresh_router(&self.config);
                self.peer = Some(addr);
                self.send_packet(&Packet::Welcome, addr).await;
            }

            Packet::Event { now_ms, event } => {
                if self.peer != Some(addr) {
                    warn!("Dropping event from unknown engine at {}", addr);
                    return;
                }
                let commands = self.route_event(now_ms, event);
                for command in commands {
                    self.send_packet(&Packet::Command(command), addr).await;
                }
            }

            Packet::Goodbye => {
                if self.peer == Some(addr) {
                    info!("Engine at {} disconnected", addr);
                    self.peer = None;
                    self.host = None;
                }
            }

            _ => {
                warn!("Unexpected packet type from engine at {}", addr);
            }
        }
    }

    /// Runs one event through the roster and router and returns the commands
    /// it produced.
    fn route_event(&mut self, now_ms: u64, event: HostEvent) -> Vec<HostCommand> {
        let Some(host) = self.host.as_mut() else {
            return Vec::new();
        };

        host.observe(now_ms, &event);
        let original = match &event {
            HostEvent::Died(death) => Some(death.clone()),
            _ => None,
        };

        if let Some(forwarded) = self.router.handle_event(host, event) {
            if original.as_ref() != Some(&forwarded) {
                host.queue(HostCommand::CreditKill(forwarded));
            }
        }
        host.drain()
    }

    fn tick(&mut self) {
        if let Some(host) = self.host.as_ref() {
            let swept = self.router.sweep(host.now());
            if swept > 0 {
                debug!("Tick retired {} mines", swept);
            }
        }
    }

    /// Main server loop
    pub async fn run(&mut self) -> Result<(), BridgeError> {
        self.spawn_network_receiver();

        let mut tick_interval = interval(self.tick_duration);
        info!("Mine bridge started");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        None => {
                            info!("Mine bridge shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.tick();
                },
            }
        }

        Ok(())
    }
}

fn fresh_router(config: &MineConfig) -> EventRouter {
    EventRouter::new(config.clone(), MineField::new(config))
}
