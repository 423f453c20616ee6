use clap::{Parser, ValueEnum};
use log::{error, info};
use server::config::{MineConfig, RetentionPolicy};
use server::network::Server;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Retention {
    /// Retire a mine after the first death it causes
    FirstKill,
    /// Keep crediting deaths until the retention window closes
    Linger,
}

impl From<Retention> for RetentionPolicy {
    fn from(retention: Retention) -> Self {
        match retention {
            Retention::FirstKill => RetentionPolicy::RemoveOnFirstKill,
            Retention::Linger => RetentionPolicy::Linger,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Bridge IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Bridge port to listen on
    #[clap(short, long, default_value = "5155")]
    port: u16,
    /// Sweeps per second for retiring resolved mines
    #[clap(short, long, default_value = "10")]
    tick_rate: u32,
    /// Seconds after spawning during which a player cannot trigger mines
    #[clap(long, default_value = "5")]
    spawn_safety: u64,
    /// Trigger half-width as a fraction of the shock-wave radius
    #[clap(long, default_value = "0.75")]
    trigger_scale: f32,
    /// What happens to a mine after its blast kills somebody
    #[clap(long, value_enum, default_value = "first-kill")]
    retention: Retention,
    /// Seconds a resolved mine is kept for kill credit
    #[clap(long, default_value = "3")]
    retention_window: u64,
    /// Flag that is turned into a mine
    #[clap(long, default_value = "US")]
    mine_flag: String,
    /// Flag that lets its carrier defuse mines
    #[clap(long, default_value = "BD")]
    defuse_flag: String,
    /// Permission required for /reload
    #[clap(long, default_value = "setAll")]
    reload_permission: String,
    /// File with one detonation message per line
    #[clap(long)]
    detonation_messages: Option<PathBuf>,
    /// File with one defusal message per line
    #[clap(long)]
    defusal_messages: Option<PathBuf>,
    /// Use the built-in detonation messages when no file is given
    #[clap(long)]
    classic_messages: bool,
}

impl Args {
    fn mine_config(&self) -> MineConfig {
        MineConfig {
            spawn_safety: Duration::from_secs(self.spawn_safety),
            trigger_scale: self.trigger_scale,
            retention: self.retention.into(),
            retention_window: Duration::from_secs(self.retention_window),
            mine_flag: self.mine_flag.clone(),
            defuse_flag: self.defuse_flag.clone(),
            reload_permission: self.reload_permission.clone(),
            detonation_messages: self.detonation_messages.clone(),
            defusal_messages: self.defusal_messages.clone(),
            classic_messages: self.classic_messages,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate.max(1) as f32);

    let mut server = Server::new(&address, tick_duration, args.mine_config()).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Mine bridge stopped: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
