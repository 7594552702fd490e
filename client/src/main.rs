//! Headless demo: runs a `server::scheduler::Scheduler` in-process over a
//! `server::room::ChannelRoom`, joins one player, drives it with a scripted
//! input sequence, and logs the predicted-vs-confirmed position so
//! prediction/reconciliation can be observed end-to-end without a real
//! transport or renderer. Grounded on the teacher's `client/src/main.rs`
//! CLI/logging bootstrap, without the `macroquad::main` window harness.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;

use client::prediction::PredictionState;
use server::config::Config;
use server::persistence::{InMemoryStatsRepository, PlayerProfile, StatsRepository};
use server::room::{ChannelRoom, Room};
use server::scheduler::Scheduler;
use shared::entities::{InputState, PlayerStats, Team};
use shared::protocol::{ClientMessage, ServerMessage};
use shared::world::StaticWorld;

#[derive(Debug, Parser)]
#[command(name = "soccer-client-demo", about = "Headless prediction/reconciliation demo")]
struct Args {
    /// Number of physics ticks to hold the right-movement input for.
    #[arg(long, default_value_t = 60)]
    ticks: u32,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let repo = Arc::new(InMemoryStatsRepository::new());
    repo.seed(1, PlayerProfile::new(PlayerStats::balanced()));

    let mut scheduler = Scheduler::new(StaticWorld::default_pitch(), ChannelRoom::new(), Config::default(), repo);
    let player_id = scheduler.clients.add_client().expect("room has capacity for the demo player");
    let mut outbound = scheduler.room.register_client(player_id);
    let inbound = scheduler.room.inbound_sender();

    inbound.send((player_id, ClientMessage::PlayerJoin { x: 0.0, y: 0.0, scene: "pitch".into() })).ok();
    inbound.send((player_id, ClientMessage::SoccerAssignTeam { team: Team::Red })).ok();

    let stop_handle = scheduler.stop_handle();
    let run_task = tokio::spawn(async move { scheduler.run().await });

    // Give the scheduler a moment to process the join/assign before the
    // first snapshot arrives.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut prediction = PredictionState::new(player_id, Team::Red, PlayerStats::balanced(), 0.0, 0.0);

    for sequence in 1..=args.ticks as u64 {
        let input = InputState { right: true, sequence, ..Default::default() };
        inbound
            .send((player_id, ClientMessage::PlayerInputBatch { inputs: vec![input] }))
            .ok();
        prediction.apply_prediction(input);

        while let Ok(message) = outbound.try_recv() {
            if let ServerMessage::PlayersPhysicsUpdate { players, last_processed_sequence } = message {
                prediction.apply_server_state(&players, &last_processed_sequence);
            }
        }

        if let Some((x, y)) = prediction.render_position(player_id) {
            info!("tick {sequence}: predicted local player at ({x:.1}, {y:.1})");
        }

        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    stop_handle.store(false, std::sync::atomic::Ordering::SeqCst);
    let _ = run_task.await;
}
