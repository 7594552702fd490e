//! Process entry point: parses CLI/env config, loads the static pitch,
//! wires the in-process room transport, and runs the scheduler loop.
//! Replaces the teacher's dual TCP/WebSocket experiment
//! (`jakobhuuse-Netcode-in-Rust/server/src/main.rs`) — real socket framing
//! is out of scope here, so this binary is the headless physics authority
//! a real gateway process would sit in front of, talking to it over
//! whatever carries `server::room::Room` messages.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;

use server::config::{Args, Config};
use server::persistence::InMemoryStatsRepository;
use server::room::ChannelRoom;
use server::scheduler::Scheduler;
use shared::world::StaticWorld;

/// Pitch data file locations, read through env vars so the data files can
/// be swapped without a rebuild (mirrors `Args`' own `env = "..."` fields).
#[derive(Debug, Parser)]
struct WorldArgs {
    #[arg(long, env = "COLLISIONS_PATH")]
    collisions_path: Option<PathBuf>,

    #[arg(long, env = "GOALS_PATH")]
    goals_path: Option<PathBuf>,
}

fn load_world(world_args: &WorldArgs) -> StaticWorld {
    match (&world_args.collisions_path, &world_args.goals_path) {
        (Some(collisions), Some(goals)) => match StaticWorld::load_from_files(collisions, goals) {
            Ok(world) => world,
            Err(err) => {
                log::warn!("falling back to the default pitch: {err}");
                StaticWorld::default_pitch()
            }
        },
        _ => StaticWorld::default_pitch(),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if std::env::var("RUST_LOG").is_err() {
        eprintln!("RUST_LOG not set; pass RUST_LOG=info to see server logs");
    }

    let args = Args::parse();
    let world_args = WorldArgs::parse();
    let config = Config::from(&args);
    let world = load_world(&world_args);
    let repo: Arc<dyn server::persistence::StatsRepository> = Arc::new(InMemoryStatsRepository::new());
    let room = ChannelRoom::new();

    info!("starting soccer physics server on {}:{}", args.host, args.port);
    info!(
        "physics {}ms, network {}ms, max_clients {}",
        config.physics_tick_ms, config.network_tick_ms, config.max_clients
    );

    let mut scheduler = Scheduler::new(world, room, config, repo);
    scheduler.run().await;
}
