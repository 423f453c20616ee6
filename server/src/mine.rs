//! A single placed mine and the rules deciding who sets it off
//!
//! A mine is armed when placed and resolves exactly once, either by
//! detonating on the player who ran into it or by being defused, in which
//! case the blast is moved onto its owner. Resolved mines are never
//! evaluated again; the field retires them once their blast has been
//! accounted for.

use crate::error::MineError;
use crate::host::{Host, Ruleset};
use log::info;
use shared::{EffectKind, EffectRequest, EffectToken, PlayerId, PlayerRecord, Team, Vec3};
use std::fmt;
use std::time::Duration;

/// Seconds a mine's shock wave stays live in the world.
pub const EFFECT_LIFETIME: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MineId(pub u64);

impl fmt::Display for MineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineStatus {
    Armed,
    Detonated,
    Defused,
}

/// The player being tested against the field on a position update.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: PlayerId,
    pub team: Team,
    pub spawned: bool,
    pub position: Vec3,
    /// Whether the player carries the defusal flag.
    pub defuser: bool,
}

impl Candidate {
    pub fn from_record(record: &PlayerRecord, defuse_flag: &str) -> Self {
        Self {
            id: record.id,
            team: record.team,
            spawned: record.spawned,
            position: record.position,
            defuser: record.carries(defuse_flag),
        }
    }
}

/// Field-wide trigger parameters, fixed for one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct TriggerRules {
    /// Half-width of the trigger cube around each mine.
    pub half_width: f32,
    pub ruleset: Ruleset,
}

impl TriggerRules {
    /// The trigger cube is kept smaller than the shock wave so a triggered
    /// mine always catches its victim.
    pub fn new(shock_radius: f32, trigger_scale: f32, ruleset: Ruleset) -> Self {
        Self {
            half_width: shock_radius * trigger_scale,
            ruleset,
        }
    }
}

/// Snapshot of a resolved mine, handed out when a death is correlated to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MineRecord {
    pub id: MineId,
    pub owner: PlayerId,
    pub owner_callsign: String,
    pub team: Team,
    pub position: Vec3,
    pub status: MineStatus,
    pub defuser: Option<PlayerId>,
    pub token: Option<EffectToken>,
}

#[derive(Debug, Clone)]
pub struct Mine {
    id: MineId,
    owner: PlayerId,
    owner_callsign: String,
    team: Team,
    position: Vec3,
    placed_at: Duration,
    status: MineStatus,
    token: Option<EffectToken>,
    defuser: Option<PlayerId>,
    resolved_at: Option<Duration>,
    kills: u32,
}

impl Mine {
    pub fn new(id: MineId, owner: &PlayerRecord, placed_at: Duration) -> Self {
        Self {
            id,
            owner: owner.id,
            owner_callsign: owner.callsign.clone(),
            team: owner.team,
            position: owner.position,
            placed_at,
            status: MineStatus::Armed,
            token: None,
            defuser: None,
            resolved_at: None,
            kills: 0,
        }
    }

    pub fn id(&self) -> MineId {
        self.id
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn owner_callsign(&self) -> &str {
        &self.owner_callsign
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn placed_at(&self) -> Duration {
        self.placed_at
    }

    pub fn status(&self) -> MineStatus {
        self.status
    }

    pub fn token(&self) -> Option<EffectToken> {
        self.token
    }

    pub fn defuser(&self) -> Option<PlayerId> {
        self.defuser
    }

    pub fn resolved_at(&self) -> Option<Duration> {
        self.resolved_at
    }

    /// Deaths credited to this mine's blast so far.
    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn is_armed(&self) -> bool {
        self.status == MineStatus::Armed
    }

    /// Resolved mines are never reused.
    pub fn is_stale(&self) -> bool {
        !self.is_armed()
    }

    pub fn eligible_to_trigger(
        &self,
        candidate: &Candidate,
        now: Duration,
        safety_deadline: Duration,
        rules: &TriggerRules,
    ) -> bool {
        if !self.is_armed() || candidate.id == self.owner || !candidate.spawned {
            return false;
        }

        let hostile = candidate.team == Team::Rogue
            || candidate.team != self.team
            || rules.ruleset == Ruleset::FreeForAll;

        hostile
            && now >= safety_deadline
            && candidate.position.within_cube(&self.position, rules.half_width)
    }

    /// Blows the mine up where it lies, on behalf of the team it was placed
    /// for.
    pub fn detonate(&mut self, host: &mut dyn Host, now: Duration) -> Result<EffectToken, MineError> {
        if !self.is_armed() {
            return Err(MineError::AlreadyResolved);
        }
        self.active_owner(host)?;

        let token = host.fire_effect(EffectRequest {
            kind: EffectKind::ShockWave,
            position: self.position,
            team: self.team,
            lifetime: EFFECT_LIFETIME,
        });

        self.resolve(MineStatus::Detonated, token, now);
        info!("Mine {} of player {} detonated", self.id, self.owner);
        Ok(token)
    }

    /// Disarms the mine and turns the blast on its owner, wherever they are
    /// now, on behalf of the defuser's team.
    pub fn defuse(
        &mut self,
        host: &mut dyn Host,
        defuser: &Candidate,
        now: Duration,
    ) -> Result<EffectToken, MineError> {
        if !self.is_armed() {
            return Err(MineError::AlreadyResolved);
        }
        let owner = self.active_owner(host)?;
        if !owner.spawned {
            return Err(MineError::OwnerInvalid);
        }

        let token = host.fire_effect(EffectRequest {
            kind: EffectKind::ShockWave,
            position: owner.position,
            team: defuser.team,
            lifetime: EFFECT_LIFETIME,
        });

        self.defuser = Some(defuser.id);
        self.resolve(MineStatus::Defused, token, now);
        info!(
            "Mine {} of player {} defused by player {}",
            self.id, self.owner, defuser.id
        );
        Ok(token)
    }

    pub fn record_kill(&mut self) {
        self.kills += 1;
    }

    pub fn record(&self) -> MineRecord {
        MineRecord {
            id: self.id,
            owner: self.owner,
            owner_callsign: self.owner_callsign.clone(),
            team: self.team,
            position: self.position,
            status: self.status,
            defuser: self.defuser,
            token: self.token,
        }
    }

    fn active_owner(&self, host: &dyn Host) -> Result<PlayerRecord, MineError> {
        host.player(self.owner)
            .filter(|owner| !owner.team.is_observer())
            .ok_or(MineError::OwnerInvalid)
    }

    fn resolve(&mut self, status: MineStatus, token: EffectToken, now: Duration) {
        self.status = status;
        self.token = Some(token);
        self.resolved_at = Some(now);
    }
}
