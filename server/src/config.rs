//! Operational knobs, CLI flags with environment-variable fallbacks,
//! following the `clap` derive pattern the teacher uses for its client and
//! server binaries (`Args` structs parsed once at startup).

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "soccer-server", about = "Authoritative soccer physics server")]
pub struct Args {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 7777)]
    pub port: u16,

    #[arg(long, env = "JWT_SECRET", default_value = "")]
    pub jwt_secret: String,

    #[arg(long, env = "PHYSICS_TICK_MS", default_value_t = 16)]
    pub physics_tick_ms: u64,

    #[arg(long, env = "NETWORK_TICK_MS", default_value_t = 25)]
    pub network_tick_ms: u64,

    #[arg(long, env = "GAME_DURATION_SECS", default_value_t = 300)]
    pub game_duration_secs: u32,

    #[arg(long, env = "OVERTIME_SECS", default_value_t = 60)]
    pub overtime_secs: u32,

    #[arg(long, env = "KICK_COOLDOWN_MS", default_value_t = 300)]
    pub kick_cooldown_ms: u64,

    #[arg(long, env = "LAG_COMP_WINDOW_MS", default_value_t = 500)]
    pub lag_comp_window_ms: u64,

    #[arg(long, env = "MAX_CLIENTS", default_value_t = 12)]
    pub max_clients: usize,

    /// Comparison/testing flag only; queue-based input consumption (the
    /// spec's default) is used unless this is set.
    #[arg(long, env = "USE_LATEST_INPUT_ONLY", default_value_t = false)]
    pub use_latest_input_only: bool,
}

/// The subset of `Args` the simulation/scheduler actually need, decoupled
/// from `clap` so non-CLI callers (tests, the demo client) can construct it
/// directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub physics_tick_ms: u64,
    pub network_tick_ms: u64,
    pub game_duration_secs: u32,
    pub overtime_secs: u32,
    pub kick_cooldown_ms: u64,
    pub lag_comp_window_ms: u64,
    pub max_clients: usize,
    pub use_latest_input_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            physics_tick_ms: 16,
            network_tick_ms: 25,
            game_duration_secs: 300,
            overtime_secs: 60,
            kick_cooldown_ms: 300,
            lag_comp_window_ms: 500,
            max_clients: 12,
            use_latest_input_only: false,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            physics_tick_ms: args.physics_tick_ms,
            network_tick_ms: args.network_tick_ms,
            game_duration_secs: args.game_duration_secs,
            overtime_secs: args.overtime_secs,
            kick_cooldown_ms: args.kick_cooldown_ms,
            lag_comp_window_ms: args.lag_comp_window_ms,
            max_clients: args.max_clients,
            use_latest_input_only: args.use_latest_input_only,
        }
    }
}
