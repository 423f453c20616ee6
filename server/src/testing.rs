//! In-memory [`Host`] for tests

use crate::host::{Host, Ruleset};
use shared::{EffectRequest, EffectToken, PlayerId, PlayerRecord, Recipient, Team, Vec3};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Records every side effect so tests can assert on them.
#[derive(Debug)]
pub struct MockHost {
    pub players: HashMap<PlayerId, PlayerRecord>,
    pub permissions: HashSet<(PlayerId, String)>,
    pub now: Duration,
    pub ruleset: Ruleset,
    pub shock_radius: f32,
    pub fired: Vec<(EffectToken, EffectRequest)>,
    pub removed_flags: Vec<PlayerId>,
    pub messages: Vec<(Recipient, String)>,
    next_token: u64,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            players: HashMap::new(),
            permissions: HashSet::new(),
            now: Duration::from_secs(100),
            ruleset: Ruleset::Teams,
            shock_radius: 10.0,
            fired: Vec::new(),
            removed_flags: Vec::new(),
            messages: Vec::new(),
            next_token: 1,
        }
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a spawned player at `position`.
    pub fn add_player(&mut self, id: PlayerId, callsign: &str, team: Team, position: Vec3) {
        let mut record = PlayerRecord::new(id, callsign, team);
        record.spawned = team != Team::Observer;
        record.position = position;
        self.players.insert(id, record);
    }

    pub fn give_flag(&mut self, id: PlayerId, flag: &str) {
        if let Some(player) = self.players.get_mut(&id) {
            player.flag = Some(flag.to_string());
        }
    }

    pub fn move_player(&mut self, id: PlayerId, position: Vec3) {
        if let Some(player) = self.players.get_mut(&id) {
            player.position = position;
        }
    }

    pub fn kill_player(&mut self, id: PlayerId) {
        if let Some(player) = self.players.get_mut(&id) {
            player.spawned = false;
        }
    }

    pub fn grant(&mut self, id: PlayerId, permission: &str) {
        self.permissions.insert((id, permission.to_string()));
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub fn messages_to(&self, to: Recipient) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(recipient, _)| *recipient == to)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl Host for MockHost {
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
        self.fired.push((token, request));
        token
    }

    fn remove_flag(&mut self, player: PlayerId) {
        if let Some(record) = self.players.get_mut(&player) {
            record.flag = None;
        }
        self.removed_flags.push(player);
    }

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        self.permissions
            .contains(&(player, permission.to_string()))
    }

    fn send_message(&mut self, to: Recipient, text: &str) {
        self.messages.push((to, text.to_string()));
    }
}
