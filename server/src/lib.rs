//! # Soccer Physics Server
//!
//! The authoritative server for a 2D top-down soccer mini-game: a ball and
//! up to twelve players on a bounded pitch, collision and goal resolution,
//! the client-prediction/reconciliation protocol, the skill effects engine,
//! and the lobby/match orchestrator.
//!
//! ## Architecture
//!
//! ### Single simulation owner
//! [`simulation::SimulationState`] is mutated only by the task running
//! [`scheduler::Scheduler`]. Every other task — network ingress, the
//! timeout sweep — only enqueues onto the structures in
//! [`client_manager::ClientManager`] or [`input`]; nothing outside the
//! scheduler task ever calls a mutating method on the simulation directly.
//!
//! ### Fixed-timestep loop
//! The scheduler drains one input per player every 16 ms physics tick,
//! applies collision/goal resolution and skill timers, and broadcasts a
//! snapshot at a separate, slower network cadence. See
//! [`scheduler`] for the drift-corrected loop.
//!
//! ### Transport as an interface
//! Real socket framing is out of scope; [`room::Room`] is the abstraction
//! a transport must satisfy (one ordered channel per client, fan-out by
//! room). [`room::ChannelRoom`] is an in-process `tokio::sync::mpsc`-backed
//! implementation used for tests and the bundled demo client.
//!
//! ## Module Organization
//!
//! - [`config`] — CLI/env configuration.
//! - [`client_manager`] — per-connection bookkeeping and input queues.
//! - [`simulation`] — the mutable simulation state (§3 of the design).
//! - [`collision`] — the ordered collision/goal resolution step.
//! - [`input`] — kick/dribble validation and ingestion.
//! - [`skills`] — skill activation and the timer-driven expiry handler.
//! - [`orchestrator`] — the lobby/selection/active match state machine.
//! - [`broadcast`] — snapshot assembly.
//! - [`scheduler`] — the fixed-timestep loop and timer wheel.
//! - [`room`] — the transport abstraction.
//! - [`persistence`] — the stats repository interface and an in-memory mock.

/// Spawn point used for spectators and not-yet-assigned players — pitch
/// centre, clear of both goal mouths.
pub const SPECTATOR_SPAWN_X: f64 = shared::kernel::PITCH_WIDTH / 2.0;
pub const SPECTATOR_SPAWN_Y: f64 = 100.0;

pub mod broadcast;
pub mod client_manager;
pub mod collision;
pub mod config;
pub mod input;
pub mod orchestrator;
pub mod persistence;
pub mod room;
pub mod scheduler;
pub mod simulation;
pub mod skills;
