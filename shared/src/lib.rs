//! # Soccer Physics Core — Shared Kernel
//!
//! This crate holds everything that must be byte-identical on both the
//! server and the client: the kinematic integration kernel, the data model
//! for ball/player/input state, the static world description, the skill
//! effect vocabulary, the wire protocol, and MMR arithmetic.
//!
//! ## Design Philosophy
//!
//! ### Deterministic simulation
//! Every function in [`kernel`] operates on `f64` and orders its operations
//! exactly as documented (drag, then displacement, then boundary clamp), so
//! that the server and any client reach bit-identical positions and
//! velocities from identical input sequences.
//!
//! ### Serialization
//! Wire types in [`protocol`] derive `Serialize`/`Deserialize` for `bincode`
//! encoding, the same convention the rest of this workspace uses for
//! network data.
//!
//! ## Module Organization
//!
//! - [`kernel`] — pure integration functions and stat multipliers.
//! - [`entities`] — `BallState`, `PlayerPhysics`, `InputState`, `Team`.
//! - [`world`] — the immutable pitch description loaded once at startup.
//! - [`skills`] — skill identifiers, the tagged effect enum, and the skill
//!   table.
//! - [`match_state`] — match/lobby state machine data and scoring formulas.
//! - [`history`] — per-entity position history ring buffers.
//! - [`protocol`] — the client/server wire message enums.
//! - [`mmr`] — MMR delta computation.

pub mod entities;
pub mod history;
pub mod kernel;
pub mod match_state;
pub mod mmr;
pub mod protocol;
pub mod skills;
pub mod world;

pub use entities::{BallState, InputState, PlayerPhysics, Team};
pub use world::StaticWorld;
