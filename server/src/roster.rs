//! Host-side view of a game engine reached over the bridge
//!
//! The engine reports players through events rather than answering
//! queries, so [`RemoteHost`] keeps the latest snapshot of every connected
//! player and answers the router's questions from it. Side effects the
//! router requests are queued and flushed back to the engine after each
//! event.
//!
//! Effect tokens are minted here and handed to the engine along with the
//! effect, so they never collide with the engine's own shot ids.

use crate::host::{Host, Ruleset};
use log::{debug, info};
use shared::{
    EffectRequest, EffectToken, HostCommand, HostEvent, PlayerId, PlayerRecord, Recipient,
};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub struct RemoteHost {
    /// Connected players indexed by their slot id
    players: HashMap<PlayerId, PlayerRecord>,
    permissions: HashMap<PlayerId, HashSet<String>>,
    now: Duration,
    ruleset: Ruleset,
    shock_radius: f32,
    next_token: u64,
    /// Commands waiting to be sent to the engine
    outbox: Vec<HostCommand>,
}

impl RemoteHost {
    pub fn new(shock_radius: f32, ruleset: Ruleset) -> Self {
        Self {
            players: HashMap::new(),
            permissions: HashMap::new(),
            now: Duration::ZERO,
            ruleset,
            shock_radius,
            next_token: 1,
            outbox: Vec::new(),
        }
    }

    /// Folds an event into the roster. Must run before the event is routed
    /// so the router sees the state the event describes.
    ///
    /// Engine timestamps that go backwards are ignored to keep the clock
    /// monotonic.
    pub fn observe(&mut self, now_ms: u64, event: &HostEvent) {
        self.now = self.now.max(Duration::from_millis(now_ms));

        match event {
            HostEvent::Joined {
                player,
                permissions,
            } => {
                info!("Player {} ({}) joined", player.id, player.callsign);
                self.players.insert(player.id, player.clone());
                self.permissions
                    .insert(player.id, permissions.iter().cloned().collect());
            }
            HostEvent::Updated(record) => {
                self.players.insert(record.id, record.clone());
            }
            HostEvent::Spawned { player, position } => {
                if let Some(record) = self.players.get_mut(player) {
                    record.spawned = true;
                    record.position = *position;
                }
            }
            HostEvent::FlagGrabbed { player, flag } => {
                if let Some(record) = self.players.get_mut(player) {
                    record.flag = Some(flag.clone());
                }
            }
            HostEvent::Died(death) => {
                if let Some(record) = self.players.get_mut(&death.victim) {
                    record.spawned = false;
                    record.flag = None;
                }
            }
            HostEvent::Parted { player } => {
                info!("Player {} left", player);
                self.players.remove(player);
                self.permissions.remove(player);
            }
            HostEvent::Command { .. } => {}
        }
    }

    pub fn queue(&mut self, command: HostCommand) {
        self.outbox.push(command);
    }

    /// Takes every queued command, oldest first.
    pub fn drain(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Host for RemoteHost {
    fn player(&self, id: PlayerId) -> Option<PlayerRecord> {
        self.players.get(&id).cloned()
    }

    fn now(&self) -> Duration {
        self.now
    }

    fn ruleset(&self) -> Ruleset {
        self.ruleset
    }

    fn shock_radius(&self) -> f32 {
        self.shock_radius
    }

    fn fire_effect(&mut self, request: EffectRequest) -> EffectToken {
        let token = EffectToken(self.next_token);
        self.next_token += 1;
        debug!("Firing {:?} as {:?}", request.kind, token);
        self.outbox.push(HostCommand::FireEffect { token, request });
        token
    }

    fn remove_flag(&mut self, player: PlayerId) {
        if let Some(record) = self.players.get_mut(&player) {
            record.flag = None;
        }
        self.outbox.push(HostCommand::RemoveFlag { player });
    }

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        self.permissions
            .get(&player)
            .map_or(false, |granted| granted.contains(permission))
    }

    fn send_message(&mut self, to: Recipient, text: &str) {
        self.outbox.push(HostCommand::SendMessage {
            to,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{DeathEvent, EffectKind, Team, Vec3};

    fn joined(id: PlayerId, callsign: &str, permissions: &[&str]) -> HostEvent {
        HostEvent::Joined {
            player: PlayerRecord::new(id, callsign, Team::Red),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_join_and_part() {
        let mut host = RemoteHost::new(10.0, Ruleset::Teams);

        host.observe(0, &joined(1, "alice", &[]));
        assert_eq!(host.len(), 1);
        assert_eq!(host.player(1).unwrap().callsign, "alice");

        host.observe(10, &HostEvent::Parted { player: 1 });
        assert!(host.is_empty());
        assert!(host.player(1).is_none());
    }

    #[test]
    fn test_spawn_and_death_track_liveness() {
        let mut host = RemoteHost::new(10.0, Ruleset::Teams);
        host.observe(0, &joined(1, "alice", &[]));

        host.observe(
            5,
            &HostEvent::Spawned {
                player: 1,
                position: Vec3::new(1.0, 2.0, 0.0),
            },
        );
        let record = host.player(1).unwrap();
        assert!(record.spawned);
        assert_eq!(record.position, Vec3::new(1.0, 2.0, 0.0));

        host.observe(
            6,
            &HostEvent::FlagGrabbed {
                player: 1,
                flag: "US".to_string(),
            },
        );
        assert!(host.player(1).unwrap().carries("US"));

        host.observe(
            9,
            &HostEvent::Died(DeathEvent {
                victim: 1,
                killer: None,
                cause: None,
            }),
        );
        let record = host.player(1).unwrap();
        assert!(!record.spawned);
        assert!(record.flag.is_none());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut host = RemoteHost::new(10.0, Ruleset::Teams);

        host.observe(2_000, &HostEvent::Parted { player: 9 });
        host.observe(1_500, &HostEvent::Parted { player: 9 });

        assert_eq!(host.now(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_permissions() {
        let mut host = RemoteHost::new(10.0, Ruleset::Teams);
        host.observe(0, &joined(1, "admin", &["setAll"]));
        host.observe(0, &joined(2, "guest", &[]));

        assert!(host.has_permission(1, "setAll"));
        assert!(!host.has_permission(2, "setAll"));
        assert!(!host.has_permission(3, "setAll"));
    }

    #[test]
    fn test_side_effects_are_queued_in_order() {
        let mut host = RemoteHost::new(10.0, Ruleset::Teams);
        host.observe(0, &joined(1, "alice", &[]));
        host.observe(
            0,
            &HostEvent::FlagGrabbed {
                player: 1,
                flag: "US".to_string(),
            },
        );

        host.remove_flag(1);
        let first = host.fire_effect(EffectRequest {
            kind: EffectKind::ShockWave,
            position: Vec3::default(),
            team: Team::Red,
            lifetime: 2.0,
        });
        let second = host.fire_effect(EffectRequest {
            kind: EffectKind::ShockWave,
            position: Vec3::default(),
            team: Team::Red,
            lifetime: 2.0,
        });
        host.send_message(Recipient::All, "boom");

        assert_ne!(first, second);
        assert!(host.player(1).unwrap().flag.is_none());

        let commands = host.drain();
        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], HostCommand::RemoveFlag { player: 1 }));
        assert!(matches!(commands[1], HostCommand::FireEffect { token, .. } if token == first));
        assert!(matches!(commands[3], HostCommand::SendMessage { to: Recipient::All, .. }));
        assert!(host.drain().is_empty());
    }
}
