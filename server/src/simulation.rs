//! The mutable simulation state owned exclusively by the scheduler task.
//! Generalizes the teacher's `GameState` (`server/src/game.rs`, owning
//! `players: HashMap<u32, Player>`) to the full data model in §3: ball,
//! per-player physics, skill state, match state, and lag-compensation
//! history.

use std::collections::HashMap;

use shared::entities::{PlayerPhysics, PlayerStats, Team};
use shared::history::HistoryBuffer;
use shared::match_state::MatchState;
use shared::skills::SkillId;
use shared::world::{BLUE_SPAWNS, RED_SPAWNS};
use shared::BallState;

use crate::skills::PlayerSkillState;

/// Owns every piece of mutable state named in the data model. Only the
/// scheduler task calls mutating methods on this struct; ingress handlers
/// enqueue onto `client_manager::Client` queues instead (§4.C).
pub struct SimulationState {
    pub tick: u64,
    pub ball: BallState,
    pub players: HashMap<u32, PlayerPhysics>,
    pub match_state: MatchState,
    pub skills: HashMap<u32, PlayerSkillState>,
    pub player_history: HashMap<u32, HistoryBuffer>,
    pub ball_history: HistoryBuffer,
    pub last_kick_tick: HashMap<u32, u64>,
    pub last_dribble_or_kick_tick: HashMap<u32, u64>,
    /// Set while a goal reset is pending; holds the tick at which it fires.
    pub pending_goal_reset_tick: Option<u64>,
    /// Set for the one step an interception occurs (first contact by a
    /// player whose team differs from the ball's previous toucher), cleared
    /// by the scheduler after it emits `BallIntercepted` — edge-triggered
    /// the same way `pending_goal_reset_tick` signals a goal.
    pub pending_interception: Option<(u32, Team)>,
    next_spawn_index: HashMap<Team, usize>,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            ball: BallState::at_center(),
            players: HashMap::new(),
            match_state: MatchState::new_lobby(),
            skills: HashMap::new(),
            player_history: HashMap::new(),
            ball_history: HistoryBuffer::new(),
            last_kick_tick: HashMap::new(),
            last_dribble_or_kick_tick: HashMap::new(),
            pending_goal_reset_tick: None,
            pending_interception: None,
            next_spawn_index: HashMap::new(),
        }
    }

    /// Assigns the next open spawn slot for `team` (wrapping if every slot
    /// has been used, since spectators can always be converted back).
    pub fn next_spawn(&mut self, team: Team) -> (f64, f64) {
        let spawns: &[(f64, f64)] = match team {
            Team::Red => &RED_SPAWNS,
            Team::Blue => &BLUE_SPAWNS,
            Team::Spectator | Team::None => &[(crate::SPECTATOR_SPAWN_X, crate::SPECTATOR_SPAWN_Y)],
        };
        let idx = self.next_spawn_index.entry(team).or_insert(0);
        let spawn = spawns[*idx % spawns.len()];
        *idx += 1;
        spawn
    }

    pub fn add_player(&mut self, id: u32, stats: PlayerStats) {
        let (x, y) = self.next_spawn(Team::Spectator);
        self.players.insert(id, PlayerPhysics::new(id, x, y, Team::Spectator, stats));
        self.skills.insert(id, PlayerSkillState::default());
        self.player_history.insert(id, HistoryBuffer::new());
        self.match_state.stats.entry(id).or_default();
    }

    pub fn remove_player(&mut self, id: u32) {
        self.players.remove(&id);
        self.skills.remove(&id);
        self.player_history.remove(&id);
        self.last_kick_tick.remove(&id);
        self.last_dribble_or_kick_tick.remove(&id);
    }

    pub fn assign_team(&mut self, id: u32, team: Team) {
        let (x, y) = self.next_spawn(team);
        if let Some(player) = self.players.get_mut(&id) {
            player.team = team;
            player.x = x;
            player.y = y;
            player.vx = 0.0;
            player.vy = 0.0;
        }
        self.match_state.teams.insert(id, team);
    }

    /// True while at least one active (non-spectator) soccer player exists —
    /// the loop-singleton condition from §3/§8.
    pub fn has_active_players(&self) -> bool {
        self.players.values().any(|p| !p.is_spectator())
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.tick * shared::kernel::FIXED_DT_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_starts_as_spectator() {
        let mut sim = SimulationState::new();
        sim.add_player(1, PlayerStats::balanced());
        assert!(sim.players[&1].is_spectator());
    }

    #[test]
    fn loop_singleton_reflects_active_players() {
        let mut sim = SimulationState::new();
        assert!(!sim.has_active_players());
        sim.add_player(1, PlayerStats::balanced());
        assert!(!sim.has_active_players());
        sim.assign_team(1, Team::Red);
        assert!(sim.has_active_players());
        sim.remove_player(1);
        assert!(!sim.has_active_players());
    }

    #[test]
    fn spawn_indices_cycle_independently_per_team() {
        let mut sim = SimulationState::new();
        let (rx0, _) = sim.next_spawn(Team::Red);
        let (bx0, _) = sim.next_spawn(Team::Blue);
        let (rx1, _) = sim.next_spawn(Team::Red);
        assert_ne!(rx0, rx1);
        assert_ne!(rx0, bx0);
    }
}
