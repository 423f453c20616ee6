//! Per-player spawn times for the post-spawn safety window

use shared::PlayerId;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct PlayerSpawnClock {
    spawned_at: HashMap<PlayerId, Duration>,
}

impl PlayerSpawnClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_spawn(&mut self, player: PlayerId, now: Duration) {
        self.spawned_at.insert(player, now);
    }

    /// Forgets a player so a reconnect reusing the id starts clean.
    pub fn forget(&mut self, player: PlayerId) {
        self.spawned_at.remove(&player);
    }

    /// Earliest time the player may set off a mine. Players without a
    /// recorded spawn get no grace period. A window too large to represent
    /// never ends.
    pub fn safety_deadline(&self, player: PlayerId, safety: Duration) -> Duration {
        self.spawned_at
            .get(&player)
            .map(|spawned| spawned.saturating_add(safety))
            .unwrap_or(Duration::ZERO)
    }

    pub fn len(&self) -> usize {
        self.spawned_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawned_at.is_empty()
    }
}
