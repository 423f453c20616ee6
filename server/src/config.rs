use std::path::PathBuf;
use std::time::Duration;

/// What happens to a resolved mine once its effect has killed somebody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// The first correlated death retires the mine; later deaths from the
    /// same blast are not credited.
    RemoveOnFirstKill,
    /// The mine stays until the retention window runs out, crediting every
    /// death its blast causes.
    Linger,
}

#[derive(Debug, Clone)]
pub struct MineConfig {
    /// Grace period after spawning during which a player cannot set off mines.
    pub spawn_safety: Duration,
    /// Fraction of the shock-wave radius used as the trigger half-width.
    pub trigger_scale: f32,
    pub retention: RetentionPolicy,
    /// How long a resolved mine is kept before the sweep removes it.
    pub retention_window: Duration,
    /// Flag that can be turned into a mine.
    pub mine_flag: String,
    /// Flag that lets its carrier defuse mines.
    pub defuse_flag: String,
    pub reload_permission: String,
    pub detonation_messages: Option<PathBuf>,
    pub defusal_messages: Option<PathBuf>,
    /// Seed the detonation bank with the built-in lines when no file is set.
    pub classic_messages: bool,
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            spawn_safety: Duration::from_secs(5),
            trigger_scale: 0.75,
            retention: RetentionPolicy::RemoveOnFirstKill,
            retention_window: Duration::from_secs(3),
            mine_flag: "US".to_string(),
            defuse_flag: "BD".to_string(),
            reload_permission: "setAll".to_string(),
            detonation_messages: None,
            defusal_messages: None,
            classic_messages: false,
        }
    }
}
