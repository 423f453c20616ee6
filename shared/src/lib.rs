use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

/// Player slot id as assigned by the host engine. Slots are reused after a
/// player leaves, so nothing keyed by it may outlive the player's session.
pub type PlayerId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Rogue,
    Red,
    Green,
    Blue,
    Purple,
    Rabbit,
    Hunter,
    Observer,
}

impl Team {
    pub fn is_observer(self) -> bool {
        self == Team::Observer
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Strict containment in the axis-aligned cube of the given half-width
    /// centered on `center`. Points on a face are outside.
    pub fn within_cube(&self, center: &Vec3, half_width: f32) -> bool {
        (self.x - center.x).abs() < half_width
            && (self.y - center.y).abs() < half_width
            && (self.z - center.z).abs() < half_width
    }
}

/// Opaque handle for an effect fired by the host. The host echoes it back
/// in the cause of any death the effect produced.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectToken(pub u64);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    ShockWave,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EffectRequest {
    pub kind: EffectKind,
    pub position: Vec3,
    pub team: Team,
    /// Seconds the effect stays live in the world.
    pub lifetime: f32,
}

/// Snapshot of a connected player as the host last reported it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub callsign: String,
    pub team: Team,
    pub spawned: bool,
    pub position: Vec3,
    /// Abbreviation of the carried flag, e.g. `US`.
    pub flag: Option<String>,
}

impl PlayerRecord {
    pub fn new(id: PlayerId, callsign: &str, team: Team) -> Self {
        Self {
            id,
            callsign: callsign.to_string(),
            team,
            spawned: false,
            position: Vec3::default(),
            flag: None,
        }
    }

    pub fn carries(&self, flag: &str) -> bool {
        self.flag.as_deref() == Some(flag)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Player(PlayerId),
    All,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DeathEvent {
    pub victim: PlayerId,
    /// `None` for world or server kills.
    pub killer: Option<PlayerId>,
    /// Token of the effect that caused the death, if any.
    pub cause: Option<EffectToken>,
}

/// Events raised by the host engine, one at a time, in the order it
/// observed them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum HostEvent {
    Joined {
        player: PlayerRecord,
        permissions: Vec<String>,
    },
    FlagGrabbed {
        player: PlayerId,
        flag: String,
    },
    Spawned {
        player: PlayerId,
        position: Vec3,
    },
    Updated(PlayerRecord),
    Died(DeathEvent),
    Parted {
        player: PlayerId,
    },
    Command {
        player: PlayerId,
        name: String,
        args: Vec<String>,
    },
}

/// Requests sent back to the host engine.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum HostCommand {
    FireEffect {
        token: EffectToken,
        request: EffectRequest,
    },
    RemoveFlag {
        player: PlayerId,
    },
    SendMessage {
        to: Recipient,
        text: String,
    },
    /// Rewritten death to apply in place of the one the host reported.
    CreditKill(DeathEvent),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Hello {
        protocol_version: u32,
        shock_radius: f32,
        free_for_all: bool,
    },
    Event {
        now_ms: u64,
        event: HostEvent,
    },
    Goodbye,

    Welcome,
    Command(HostCommand),
    Rejected {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_cube_containment() {
        let center = Vec3::new(10.0, 10.0, 0.0);
        assert!(Vec3::new(10.0, 10.0, 0.0).within_cube(&center, 1.0));
        assert!(Vec3::new(10.9, 9.1, 0.5).within_cube(&center, 1.0));
        assert!(!Vec3::new(11.5, 10.0, 0.0).within_cube(&center, 1.0));
        assert!(!Vec3::new(10.0, 10.0, -2.0).within_cube(&center, 1.0));
    }

    #[test]
    fn test_cube_boundary_is_outside() {
        let center = Vec3::new(0.0, 0.0, 0.0);
        assert!(!Vec3::new(4.0, 0.0, 0.0).within_cube(&center, 4.0));
        assert!(!Vec3::new(0.0, -4.0, 0.0).within_cube(&center, 4.0));
        assert!(Vec3::new(3.99, 0.0, 0.0).within_cube(&center, 4.0));
    }

    #[test]
    fn test_cube_is_not_a_sphere() {
        // Corners of the cube are farther than the half-width but still inside.
        let center = Vec3::default();
        let corner = Vec3::new(2.9, 2.9, 2.9);
        let distance = (corner.x * corner.x + corner.y * corner.y + corner.z * corner.z).sqrt();
        assert_approx_eq!(distance, 5.0229, 0.001);
        assert!(corner.within_cube(&center, 3.0));
    }

    #[test]
    fn test_player_record_flag() {
        let mut player = PlayerRecord::new(3, "tanker", Team::Red);
        assert!(!player.spawned);
        assert!(!player.carries("US"));

        player.flag = Some("US".to_string());
        assert!(player.carries("US"));
        assert!(!player.carries("BD"));
    }

    #[test]
    fn test_observer_team() {
        assert!(Team::Observer.is_observer());
        assert!(!Team::Rogue.is_observer());
    }

    #[test]
    fn test_packet_serialization_event() {
        let packet = Packet::Event {
            now_ms: 1500,
            event: HostEvent::Died(DeathEvent {
                victim: 2,
                killer: None,
                cause: Some(EffectToken(77)),
            }),
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Event {
                now_ms,
                event: HostEvent::Died(death),
            } => {
                assert_eq!(now_ms, 1500);
                assert_eq!(death.victim, 2);
                assert_eq!(death.killer, None);
                assert_eq!(death.cause, Some(EffectToken(77)));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_fire_effect() {
        let packet = Packet::Command(HostCommand::FireEffect {
            token: EffectToken(9),
            request: EffectRequest {
                kind: EffectKind::ShockWave,
                position: Vec3::new(1.0, 2.0, 3.0),
                team: Team::Blue,
                lifetime: 2.0,
            },
        });

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Command(HostCommand::FireEffect { token, request }) => {
                assert_eq!(token, EffectToken(9));
                assert_eq!(request.team, Team::Blue);
                assert_eq!(request.position, Vec3::new(1.0, 2.0, 3.0));
                assert_approx_eq!(request.lifetime, 2.0, 0.0001);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
