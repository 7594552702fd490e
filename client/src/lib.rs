//! # Soccer Client Prediction Library
//!
//! The client half of the netcode contract: local prediction of the
//! player's own movement plus reconciliation against the server's
//! authoritative snapshots. Rendering and keyboard capture are out of
//! scope — this crate is driven headlessly, either by the bundled demo
//! binary or by a real front-end that supplies inputs and consumes render
//! positions.
//!
//! ## Module Organization
//!
//! - [`prediction`] — `PredictionState`: predicted local player, confirmed
//!   remote snapshots, and the three-tier reconciliation policy.

pub mod prediction;
