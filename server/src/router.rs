//! Dispatch of host events and player commands onto the mine field
//!
//! The router holds no game state of its own beyond what it delegates to:
//! the mine field, the spawn clock and the two message banks. Every event
//! is handled to completion before the next one arrives, so a death can
//! only ever be correlated with a blast that was fired earlier.

use crate::config::MineConfig;
use crate::error::{MessageError, PlaceError};
use crate::host::Host;
use crate::messages::{classic_detonation_templates, render, Bindings, FileSource, MessageBank};
use crate::mine::{Candidate, MineId, MineRecord, MineStatus};
use crate::minefield::{MineField, Outcome};
use crate::spawn_clock::PlayerSpawnClock;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{DeathEvent, HostEvent, PlayerId, PlayerRecord, Recipient};
use std::time::Duration;

const VICTIM_NOTICE: &str = "You ran into a mine!";
const OWNER_NOTICE: &str = "Your mine claimed a victim!";
const DEFUSED_VICTIM_NOTICE: &str = "You were caught by a defused mine!";
const DEFUSER_NOTICE: &str = "You defused a mine and turned it on its owner!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    Detonation,
    Defusal,
}

impl BankKind {
    fn label(self) -> &'static str {
        match self {
            Self::Detonation => "death messages",
            Self::Defusal => "defusal messages",
        }
    }
}

pub struct EventRouter {
    config: MineConfig,
    field: MineField,
    spawn_clock: PlayerSpawnClock,
    detonation_messages: MessageBank,
    defusal_messages: MessageBank,
    rng: StdRng,
}

impl EventRouter {
    /// Builds a router around `field` and loads the configured message files.
    pub fn new(config: MineConfig, field: MineField) -> Self {
        let mut router = Self {
            config,
            field,
            spawn_clock: PlayerSpawnClock::new(),
            detonation_messages: MessageBank::new(),
            defusal_messages: MessageBank::new(),
            rng: StdRng::from_entropy(),
        };

        if router.config.detonation_messages.is_some() {
            if let Err(e) = router.reload_bank(BankKind::Detonation) {
                warn!("Starting with no death messages: {}", e);
            }
        } else if router.config.classic_messages {
            router.detonation_messages = MessageBank::with_templates(classic_detonation_templates());
        }
        if router.config.defusal_messages.is_some() {
            if let Err(e) = router.reload_bank(BankKind::Defusal) {
                warn!("Starting with no defusal messages: {}", e);
            }
        }

        router
    }

    /// Replaces the random source used to pick messages.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Handles one host event. Deaths are returned, possibly with their
    /// killer rewritten, so the host can apply them.
    pub fn handle_event(&mut self, host: &mut dyn Host, event: HostEvent) -> Option<DeathEvent> {
        match event {
            HostEvent::Joined { player, .. } => {
                debug!("Player {} ({}) joined", player.id, player.callsign);
            }
            HostEvent::FlagGrabbed { player, flag } => self.on_flag_grabbed(host, player, &flag),
            HostEvent::Spawned { player, .. } => {
                let now = host.now();
                self.on_spawn(player, now);
            }
            HostEvent::Updated(record) => {
                self.on_player_update(host, &record);
            }
            HostEvent::Died(death) => return Some(self.on_player_died(host, death)),
            HostEvent::Parted { player } => self.on_part(player),
            HostEvent::Command { player, name, args } => {
                if !self.on_command(host, player, &name, &args) {
                    debug!("Ignoring unknown command /{} from player {}", name, player);
                }
            }
        }
        None
    }

    pub fn on_flag_grabbed(&mut self, host: &mut dyn Host, player: PlayerId, flag: &str) {
        if flag == self.config.mine_flag {
            host.send_message(
                Recipient::Player(player),
                "You grabbed a Useless flag! Type /mine at any time to set a useless mine!",
            );
        } else if flag == self.config.defuse_flag {
            host.send_message(
                Recipient::Player(player),
                "You grabbed a Bomb Defusal flag! Drive over enemy mines to turn them on their owners.",
            );
        }
    }

    pub fn on_spawn(&mut self, player: PlayerId, now: Duration) {
        self.spawn_clock.record_spawn(player, now);
    }

    pub fn on_part(&mut self, player: PlayerId) {
        self.field.remove_owner_mines(player);
        self.spawn_clock.forget(player);
    }

    /// Tests the reported snapshot against the field. Nothing is announced
    /// here; the announcement waits for the resulting death.
    pub fn on_player_update(&mut self, host: &mut dyn Host, record: &PlayerRecord) -> Option<(MineId, Outcome)> {
        let now = host.now();
        self.field.sweep_stale(now);

        let candidate = Candidate::from_record(record, &self.config.defuse_flag);
        let deadline = self.spawn_clock.safety_deadline(record.id, self.config.spawn_safety);
        self.field.evaluate(host, &candidate, now, deadline)
    }

    pub fn on_player_died(&mut self, host: &mut dyn Host, death: DeathEvent) -> DeathEvent {
        let Some(token) = death.cause else {
            return death;
        };
        let Some(record) = self.field.resolve_by_correlation(token) else {
            return death;
        };

        let rewritten = rewrite_kill(&death, &record);
        info!(
            "Mine {} killed player {}, credited to {:?}",
            record.id, rewritten.victim, rewritten.killer
        );
        self.announce(host, &rewritten, &record);
        rewritten
    }

    /// Runs a player command. Returns false for commands this router does
    /// not own.
    pub fn on_command(&mut self, host: &mut dyn Host, player: PlayerId, name: &str, args: &[String]) -> bool {
        match name {
            "mine" => self.place_mine(host, player),
            "minecount" => {
                let count = self.field.count(false);
                let text = match count {
                    1 => "There is 1 active mine.".to_string(),
                    n => format!("There are {n} active mines."),
                };
                host.send_message(Recipient::Player(player), &text);
            }
            "minestats" => self.send_stats(host, player),
            "reload" => self.reload_command(host, player, args),
            _ => return false,
        }
        true
    }

    /// Retires resolved mines whose retention window has passed.
    pub fn sweep(&mut self, now: Duration) -> usize {
        self.field.sweep_stale(now)
    }

    /// Reloads one bank from its configured file, keeping the old list on
    /// failure.
    pub fn reload_bank(&mut self, kind: BankKind) -> Result<usize, MessageError> {
        let (path, bank) = match kind {
            BankKind::Detonation => (&self.config.detonation_messages, &mut self.detonation_messages),
            BankKind::Defusal => (&self.config.defusal_messages, &mut self.defusal_messages),
        };

        match path.as_deref() {
            Some(path) => bank.reload(&FileSource::new(path)),
            None => {
                warn!("Cannot reload {}: no file configured", kind.label());
                Err(MessageError::NoSource)
            }
        }
    }

    pub fn field(&self) -> &MineField {
        &self.field
    }

    pub fn spawn_clock(&self) -> &PlayerSpawnClock {
        &self.spawn_clock
    }

    pub fn bank(&self, kind: BankKind) -> &MessageBank {
        match kind {
            BankKind::Detonation => &self.detonation_messages,
            BankKind::Defusal => &self.defusal_messages,
        }
    }

    pub fn config(&self) -> &MineConfig {
        &self.config
    }

    fn place_mine(&mut self, host: &mut dyn Host, player: PlayerId) {
        let Some(record) = host.player(player) else {
            return;
        };

        match check_placement(&record, &self.config.mine_flag) {
            Ok(()) => {
                let now = host.now();
                self.field.place(host, &record, now);
                let count = self.field.count(false);
                host.send_message(
                    Recipient::Player(player),
                    &format!("Useless mine set! Active mines: {count}"),
                );
            }
            Err(e) => host.send_message(Recipient::Player(player), &e.to_string()),
        }
    }

    fn send_stats(&self, host: &mut dyn Host, player: PlayerId) {
        let stats = self.field.stats_by_owner();
        if stats.is_empty() {
            host.send_message(Recipient::Player(player), "There are no active mines.");
            return;
        }

        host.send_message(Recipient::Player(player), "Active mines by player:");
        for (callsign, count) in stats {
            host.send_message(Recipient::Player(player), &format!("  {callsign}: {count}"));
        }
    }

    fn reload_command(&mut self, host: &mut dyn Host, player: PlayerId, args: &[String]) {
        if !host.has_permission(player, &self.config.reload_permission) {
            host.send_message(
                Recipient::Player(player),
                "You do not have permission to reload mine messages.",
            );
            return;
        }

        let kinds: &[BankKind] = match args.first().map(String::as_str) {
            None => &[BankKind::Detonation, BankKind::Defusal],
            Some("deathmessages") => &[BankKind::Detonation],
            Some("defusalmessages") => &[BankKind::Defusal],
            Some(_) => {
                host.send_message(
                    Recipient::Player(player),
                    "Usage: /reload [deathmessages|defusalmessages]",
                );
                return;
            }
        };

        for kind in kinds {
            let text = match self.reload_bank(*kind) {
                Ok(count) => format!("Reloaded {} {}.", count, kind.label()),
                Err(e) => format!(
                    "Warning: could not reload {} ({}); keeping {} messages.",
                    kind.label(),
                    e,
                    self.bank(*kind).len()
                ),
            };
            host.send_message(Recipient::Player(player), &text);
        }
    }

    fn announce(&mut self, host: &mut dyn Host, death: &DeathEvent, record: &MineRecord) {
        let Some(victim) = host.player(death.victim) else {
            return;
        };
        let defuser = record.defuser.and_then(|id| host.player(id));
        let mine_count = self.field.count(false);

        let bank = match record.status {
            MineStatus::Defused => &self.defusal_messages,
            _ => &self.detonation_messages,
        };

        match bank.pick_random(&mut self.rng) {
            Some(template) => {
                let bindings = Bindings {
                    owner: &record.owner_callsign,
                    victim: &victim.callsign,
                    defuser: defuser.as_ref().map(|d| d.callsign.as_str()),
                    mine_count,
                };
                host.send_message(Recipient::All, &render(template, &bindings));
            }
            None => send_fallback(host, death, record),
        }
    }
}

/// Credits a mine kill to whoever earned it: the owner for a detonation,
/// the defuser for a defusal.
pub fn rewrite_kill(death: &DeathEvent, record: &MineRecord) -> DeathEvent {
    let killer = match record.status {
        MineStatus::Detonated => Some(record.owner),
        MineStatus::Defused => record.defuser,
        MineStatus::Armed => death.killer,
    };

    DeathEvent {
        killer,
        ..death.clone()
    }
}

pub fn check_placement(record: &PlayerRecord, mine_flag: &str) -> Result<(), PlaceError> {
    if record.team.is_observer() {
        return Err(PlaceError::Observer);
    }
    if !record.spawned {
        return Err(PlaceError::NotSpawned);
    }
    if !record.carries(mine_flag) {
        return Err(PlaceError::MissingFlag);
    }
    Ok(())
}

fn send_fallback(host: &mut dyn Host, death: &DeathEvent, record: &MineRecord) {
    match record.status {
        MineStatus::Defused => {
            host.send_message(Recipient::Player(death.victim), DEFUSED_VICTIM_NOTICE);
            if let Some(defuser) = record.defuser.filter(|id| *id != death.victim) {
                host.send_message(Recipient::Player(defuser), DEFUSER_NOTICE);
            }
        }
        _ => {
            host.send_message(Recipient::Player(death.victim), VICTIM_NOTICE);
            if record.owner != death.victim {
                host.send_message(Recipient::Player(record.owner), OWNER_NOTICE);
            }
        }
    }
}
