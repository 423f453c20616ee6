//! The seam between the mine engine and the game engine hosting it
//!
//! Everything the engine needs from the outside world goes through [`Host`]:
//! player snapshots, the clock, the shock-wave radius, and the handful of
//! side effects it may request. The engine never simulates movement or
//! damage itself.

use shared::{EffectRequest, EffectToken, PlayerId, PlayerRecord, Recipient};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ruleset {
    Teams,
    FreeForAll,
}

pub trait Host {
    /// Current snapshot of a connected player, `None` once they have left.
    fn player(&self, id: PlayerId) -> Option<PlayerRecord>;

    /// Monotonic time since the session started.
    fn now(&self) -> Duration;

    fn ruleset(&self) -> Ruleset;

    /// Radius of the damage engine's shock wave, in world units.
    fn shock_radius(&self) -> f32;

    /// Fires an effect in the world and returns the token the host will
    /// report as the cause of any resulting death.
    fn fire_effect(&mut self, request: EffectRequest) -> EffectToken;

    /// Takes the carried flag away from a player.
    fn remove_flag(&mut self, player: PlayerId);

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool;

    fn send_message(&mut self, to: Recipient, text: &str);
}
