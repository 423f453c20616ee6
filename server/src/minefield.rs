//! The live set of mines and the per-update trigger pass
//!
//! The field owns every mine placed during the session. Mines are kept in
//! placement order so the trigger pass is deterministic: when a player
//! stands in several trigger cubes at once, the oldest eligible mine goes
//! off. A secondary index maps effect tokens back to the mine that fired
//! them, which is how a death reported by the host is correlated with a
//! blast.
//!
//! Resolved mines linger for a short retention window so the death caused
//! by their blast can still be matched. The sweep retires them afterwards,
//! including those whose blast hit nobody.

use crate::config::{MineConfig, RetentionPolicy};
use crate::host::Host;
use crate::mine::{Candidate, Mine, MineId, MineRecord, TriggerRules};
use log::{debug, info};
use shared::{EffectToken, PlayerId, PlayerRecord};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Detonated(EffectToken),
    Defused(EffectToken),
}

impl Outcome {
    pub fn token(&self) -> EffectToken {
        match self {
            Self::Detonated(token) | Self::Defused(token) => *token,
        }
    }
}

pub struct MineField {
    mines: BTreeMap<MineId, Mine>,
    by_token: HashMap<EffectToken, MineId>,
    next_id: u64,
    trigger_scale: f32,
    retention: RetentionPolicy,
    retention_window: Duration,
}

impl MineField {
    pub fn new(config: &MineConfig) -> Self {
        Self {
            mines: BTreeMap::new(),
            by_token: HashMap::new(),
            next_id: 1,
            trigger_scale: config.trigger_scale,
            retention: config.retention,
            retention_window: config.retention_window,
        }
    }

    /// Plants an armed mine at the owner's position and takes their flag.
    ///
    /// The caller is responsible for checking that the owner may place a
    /// mine at all.
    pub fn place(&mut self, host: &mut dyn Host, owner: &PlayerRecord, now: Duration) -> MineId {
        let id = MineId(self.next_id);
        self.next_id += 1;

        host.remove_flag(owner.id);
        self.mines.insert(id, Mine::new(id, owner, now));

        info!(
            "Player {} placed mine {} at ({:.1}, {:.1}, {:.1})",
            owner.id, id, owner.position.x, owner.position.y, owner.position.z
        );
        id
    }

    /// Tests a player against every armed mine and sets off at most one.
    ///
    /// Carriers of the defusal flag defuse the mine instead of detonating
    /// it. A mine whose transition fails (its owner is observing, or has no
    /// live position to receive a defused blast) stays armed and the scan
    /// moves on.
    pub fn evaluate(
        &mut self,
        host: &mut dyn Host,
        candidate: &Candidate,
        now: Duration,
        safety_deadline: Duration,
    ) -> Option<(MineId, Outcome)> {
        let rules = TriggerRules::new(host.shock_radius(), self.trigger_scale, host.ruleset());

        for mine in self.mines.values_mut() {
            if !mine.eligible_to_trigger(candidate, now, safety_deadline, &rules) {
                continue;
            }

            let result = if candidate.defuser {
                mine.defuse(host, candidate, now).map(Outcome::Defused)
            } else {
                mine.detonate(host, now).map(Outcome::Detonated)
            };

            match result {
                Ok(outcome) => {
                    self.by_token.insert(outcome.token(), mine.id());
                    return Some((mine.id(), outcome));
                }
                Err(e) => {
                    debug!("Mine {} not triggered by player {}: {}", mine.id(), candidate.id, e);
                }
            }
        }

        None
    }

    /// Finds the mine whose blast carries `token` and credits it with a kill.
    ///
    /// Unknown tokens, including those of mines removed because their owner
    /// left, match nothing and change nothing.
    pub fn resolve_by_correlation(&mut self, token: EffectToken) -> Option<MineRecord> {
        let id = *self.by_token.get(&token)?;
        let mine = self.mines.get_mut(&id)?;
        mine.record_kill();
        let record = mine.record();

        if self.retention == RetentionPolicy::RemoveOnFirstKill {
            self.remove(id);
        }

        debug!("Effect {:?} correlated to mine {}", token, id);
        Some(record)
    }

    /// Removes every mine the player owns, whatever its status.
    pub fn remove_owner_mines(&mut self, owner: PlayerId) -> usize {
        let owned: Vec<MineId> = self
            .mines
            .values()
            .filter(|mine| mine.owner() == owner)
            .map(|mine| mine.id())
            .collect();

        for id in &owned {
            self.remove(*id);
        }

        if !owned.is_empty() {
            info!("Removed {} mines of player {}", owned.len(), owner);
        }
        owned.len()
    }

    /// Retires resolved mines whose retention window has run out.
    pub fn sweep_stale(&mut self, now: Duration) -> usize {
        let window = self.retention_window;
        let expired: Vec<MineId> = self
            .mines
            .values()
            .filter(|mine| mine.is_stale())
            .filter(|mine| {
                mine.resolved_at()
                    .map_or(false, |resolved| now >= resolved.saturating_add(window))
            })
            .map(|mine| mine.id())
            .collect();

        for id in &expired {
            self.remove(*id);
        }

        if !expired.is_empty() {
            debug!("Swept {} resolved mines", expired.len());
        }
        expired.len()
    }

    pub fn count(&self, include_resolved: bool) -> usize {
        if include_resolved {
            self.mines.len()
        } else {
            self.mines.values().filter(|mine| mine.is_armed()).count()
        }
    }

    /// Armed mines per owner, most first. Equal counts are ordered by
    /// callsign, then by player id.
    pub fn stats_by_owner(&self) -> Vec<(String, usize)> {
        let mut per_owner: HashMap<PlayerId, (&str, usize)> = HashMap::new();
        for mine in self.mines.values().filter(|mine| mine.is_armed()) {
            per_owner
                .entry(mine.owner())
                .or_insert((mine.owner_callsign(), 0))
                .1 += 1;
        }

        let mut stats: Vec<(PlayerId, &str, usize)> = per_owner
            .into_iter()
            .map(|(owner, (callsign, count))| (owner, callsign, count))
            .collect();
        stats.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)).then(a.0.cmp(&b.0)));

        stats
            .into_iter()
            .map(|(_, callsign, count)| (callsign.to_string(), count))
            .collect()
    }

    pub fn get(&self, id: MineId) -> Option<&Mine> {
        self.mines.get(&id)
    }

    pub fn mines(&self) -> impl Iterator<Item = &Mine> {
        self.mines.values()
    }

    pub fn len(&self) -> usize {
        self.mines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mines.is_empty()
    }

    fn remove(&mut self, id: MineId) -> Option<Mine> {
        let mine = self.mines.remove(&id)?;
        if let Some(token) = mine.token() {
            self.by_token.remove(&token);
        }
        Some(mine)
    }
}
