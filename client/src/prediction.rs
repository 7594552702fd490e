//! Client-side prediction and reconciliation.
//!
//! Generalizes the teacher's `ClientGameState`
//! (`jakobhuuse-Netcode-in-Rust/client/src/game.rs`) from its single
//! `distance > 1.0` rollback trigger to the three-tier correction policy:
//! small errors are ignored, medium errors are nudged in gradually, large
//! errors snap straight to the confirmed state and replay unacknowledged
//! input. Velocity mismatches below a separate small threshold are left
//! alone even when the position triggers a correction, so a momentary
//! drag-coefficient difference doesn't cause visible velocity popping.

use std::collections::HashMap;

use shared::entities::{InputState, PlayerPhysics, PlayerStats, Team};
use shared::kernel::{self, FIXED_DT};
use shared::protocol::PlayerSnapshot;

/// Below this position error (pixels), the predicted state is left exactly
/// as it is — the server and client already agree closely enough.
pub const IGNORE_THRESHOLD: f64 = 5.0;
/// Above this position error (pixels), prediction has diverged too far to
/// correct gradually; snap straight to confirmed and replay.
pub const SNAP_THRESHOLD: f64 = 200.0;
/// Fraction of the remaining position error closed per reconciliation in
/// the interpolate band (`IGNORE_THRESHOLD..=SNAP_THRESHOLD`).
const INTERPOLATION_ALPHA: f64 = 0.15;
/// Below this velocity error (pixels/second), velocity is never corrected,
/// even when position is.
pub const VELOCITY_IGNORE_THRESHOLD: f64 = 20.0;

/// A remote player's last-known confirmed snapshot; remote players are
/// never predicted, only rendered from whatever the server last sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteSnapshot {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl From<&PlayerSnapshot> for RemoteSnapshot {
    fn from(s: &PlayerSnapshot) -> Self {
        Self { x: s.x, y: s.y, vx: s.vx, vy: s.vy }
    }
}

/// Per-connection prediction state: the local player is simulated ahead of
/// the server using the same kernel it runs, replayed against unconfirmed
/// inputs whenever the server's confirmed state diverges enough to matter.
pub struct PredictionState {
    pub local_player: PlayerPhysics,
    pub confirmed: HashMap<u32, RemoteSnapshot>,
    pub input_history: Vec<InputState>,
}

impl PredictionState {
    pub fn new(local_player_id: u32, team: Team, stats: PlayerStats, x: f64, y: f64) -> Self {
        Self {
            local_player: PlayerPhysics::new(local_player_id, x, y, team, stats),
            confirmed: HashMap::new(),
            input_history: Vec::new(),
        }
    }

    fn multipliers(&self) -> (f64, f64) {
        let stats = self.local_player.stats;
        (kernel::drag_mul(stats.dribbling), kernel::speed_mul(stats.speed))
    }

    /// Applies one input immediately to the local predicted player and
    /// records it for replay, matching the teacher's "predict immediately,
    /// reconcile later" ordering.
    pub fn apply_prediction(&mut self, input: InputState) {
        self.input_history.push(input);
        let (drag_mul, speed_mul) = self.multipliers();
        kernel::integrate_player(&mut self.local_player, &input, FIXED_DT, drag_mul, speed_mul);
    }

    /// Processes an authoritative snapshot batch: updates every remote
    /// player's confirmed position, drops acknowledged inputs from the
    /// local replay history, and reconciles the local predicted player
    /// against its own confirmed snapshot if present.
    pub fn apply_server_state(&mut self, players: &[PlayerSnapshot], last_processed_sequence: &HashMap<u32, u64>) {
        for snapshot in players {
            self.confirmed.insert(snapshot.id, RemoteSnapshot::from(snapshot));
        }

        let local_id = self.local_player.id;
        if let Some(&acked) = last_processed_sequence.get(&local_id) {
            self.input_history.retain(|input| input.sequence > acked);
        }

        if let Some(confirmed) = self.confirmed.get(&local_id).copied() {
            self.reconcile(confirmed);
        }
    }

    fn reconcile(&mut self, confirmed: RemoteSnapshot) {
        let dx = confirmed.x - self.local_player.x;
        let dy = confirmed.y - self.local_player.y;
        let position_error = (dx * dx + dy * dy).sqrt();

        if position_error >= SNAP_THRESHOLD {
            self.local_player.x = confirmed.x;
            self.local_player.y = confirmed.y;
            self.local_player.vx = confirmed.vx;
            self.local_player.vy = confirmed.vy;
            let (drag_mul, speed_mul) = self.multipliers();
            for input in &self.input_history {
                kernel::integrate_player(&mut self.local_player, input, FIXED_DT, drag_mul, speed_mul);
            }
        } else if position_error > IGNORE_THRESHOLD {
            self.local_player.x += dx * INTERPOLATION_ALPHA;
            self.local_player.y += dy * INTERPOLATION_ALPHA;
        }

        let dvx = confirmed.vx - self.local_player.vx;
        let dvy = confirmed.vy - self.local_player.vy;
        if (dvx * dvx + dvy * dvy).sqrt() >= VELOCITY_IGNORE_THRESHOLD {
            self.local_player.vx = confirmed.vx;
            self.local_player.vy = confirmed.vy;
        }
    }

    /// Render position for any player: predicted for the local player,
    /// last-confirmed for everyone else.
    pub fn render_position(&self, player_id: u32) -> Option<(f64, f64)> {
        if player_id == self.local_player.id {
            Some((self.local_player.x, self.local_player.y))
        } else {
            self.confirmed.get(&player_id).map(|s| (s.x, s.y))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: u32, x: f64, y: f64, vx: f64, vy: f64) -> PlayerSnapshot {
        PlayerSnapshot { id, x, y, vx, vy, is_ghosted: false, is_spectator: false, last_processed_sequence: 0, timestamp: 0 }
    }

    #[test]
    fn small_divergence_is_ignored() {
        let mut state = PredictionState::new(1, Team::Red, PlayerStats::balanced(), 100.0, 100.0);
        let players = vec![snapshot(1, 102.0, 100.0, 0.0, 0.0)];
        state.apply_server_state(&players, &HashMap::new());
        assert_eq!(state.local_player.x, 100.0);
    }

    #[test]
    fn medium_divergence_interpolates_partway() {
        let mut state = PredictionState::new(1, Team::Red, PlayerStats::balanced(), 100.0, 100.0);
        let players = vec![snapshot(1, 150.0, 100.0, 0.0, 0.0)];
        state.apply_server_state(&players, &HashMap::new());
        assert!(state.local_player.x > 100.0 && state.local_player.x < 150.0);
    }

    #[test]
    fn large_divergence_snaps_and_replays() {
        let mut state = PredictionState::new(1, Team::Red, PlayerStats::balanced(), 100.0, 100.0);
        let input = InputState { right: true, sequence: 1, ..Default::default() };
        state.apply_prediction(input);

        let mut acked = HashMap::new();
        acked.insert(1u32, 0u64);
        let players = vec![snapshot(1, 900.0, 100.0, 0.0, 0.0)];
        state.apply_server_state(&players, &acked);

        assert!(state.local_player.x > 900.0, "replay should have moved past the snap point");
        assert_eq!(state.input_history.len(), 1);
    }

    #[test]
    fn small_velocity_error_is_left_alone() {
        let mut state = PredictionState::new(1, Team::Red, PlayerStats::balanced(), 100.0, 100.0);
        state.local_player.vx = 10.0;
        let players = vec![snapshot(1, 100.0, 100.0, 15.0, 0.0)];
        state.apply_server_state(&players, &HashMap::new());
        assert_eq!(state.local_player.vx, 10.0);
    }

    #[test]
    fn remote_players_are_never_predicted() {
        let mut state = PredictionState::new(1, Team::Red, PlayerStats::balanced(), 100.0, 100.0);
        let players = vec![snapshot(2, 500.0, 500.0, 0.0, 0.0)];
        state.apply_server_state(&players, &HashMap::new());
        assert_eq!(state.render_position(2), Some((500.0, 500.0)));
    }
}
