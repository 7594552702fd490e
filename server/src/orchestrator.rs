//! The lobby/selection/active match state machine: team assignment, snake
//! skill selection with auto-pick-on-timeout, the game clock and overtime,
//! and end-of-match MVP/MMR settlement. The teacher has no match/lobby
//! concept to generalize directly; this follows the same plain
//! struct-plus-methods-returning-bool/Option shape as `client_manager.rs`,
//! state-machine-enum idiom borrowed from the teacher's `main.rs` draft's
//! `ConnectionType`.

use rand::seq::SliceRandom;
use rand::Rng;

use shared::entities::Team;
use shared::match_state::{MatchStatus, SelectionState, GAME_DURATION_SECS, OVERTIME_SECS, SELECTION_TURN_SECS};
use shared::mmr::{compute_mmr_delta, MmrUpdate};
use shared::skills::SkillId;

use crate::persistence::{PlayerProfile, StatsRepository};
use crate::simulation::SimulationState;

/// Outcome of a game-end settlement: winner plus one MMR update per
/// player with a persisted profile.
pub struct GameEndResult {
    pub winner: Team,
    pub mvp_player_id: Option<u32>,
    pub mmr_updates: Vec<MmrUpdate>,
}

/// Assigns `player_id` to `team`, teleporting them to the next open spawn
/// for that team. Only valid in `Lobby` — called elsewhere only from
/// lobby-phase message handling.
pub fn assign_team(sim: &mut SimulationState, player_id: u32, team: Team) {
    sim.assign_team(player_id, team);
}

/// Shuffles every non-spectator-eligible connected player evenly across
/// the two teams.
pub fn randomize_teams(sim: &mut SimulationState, rng: &mut impl Rng) {
    let mut ids: Vec<u32> = sim.players.keys().copied().collect();
    ids.shuffle(rng);
    for (i, id) in ids.into_iter().enumerate() {
        let team = if i % 2 == 0 { Team::Red } else { Team::Blue };
        sim.assign_team(id, team);
    }
}

/// Builds the snake/zigzag pick order: alternating red/blue so no team
/// gets two consecutive picks, preserving join order within each team.
fn snake_order(sim: &SimulationState) -> Vec<u32> {
    let mut red: Vec<u32> = sim.players.values().filter(|p| p.team == Team::Red).map(|p| p.id).collect();
    let mut blue: Vec<u32> = sim.players.values().filter(|p| p.team == Team::Blue).map(|p| p.id).collect();
    red.sort_unstable();
    blue.sort_unstable();
    let mut order = Vec::with_capacity(red.len() + blue.len());
    let mut r = red.into_iter();
    let mut b = blue.into_iter();
    loop {
        let (ra, ba) = (r.next(), b.next());
        match (ra, ba) {
            (None, None) => break,
            (Some(x), None) => order.push(x),
            (None, Some(y)) => order.push(y),
            (Some(x), Some(y)) => {
                order.push(x);
                order.push(y);
            }
        }
    }
    order
}

/// Transitions `Lobby` → `SkillSelection`: builds the pick order, resets
/// the available-skill set, and arms the first turn's deadline.
pub fn start_selection(sim: &mut SimulationState) {
    let order = snake_order(sim);
    sim.match_state.selection = SelectionState {
        order,
        current_index: 0,
        available: SkillId::ALL.to_vec(),
        turn_deadline_ms: sim.elapsed_ms() + SELECTION_TURN_SECS as u64 * 1000,
    };
    sim.match_state.status = MatchStatus::SkillSelection;
}

/// Records `player_id`'s pick if it's their turn and the skill is still
/// available; advances to the next picker, refilling the available set
/// (wrapping) once it's exhausted, and starts the match once every picker
/// has chosen. Returns `true` on an accepted pick.
pub fn pick_skill(sim: &mut SimulationState, player_id: u32, skill_id: SkillId) -> bool {
    if sim.match_state.status != MatchStatus::SkillSelection {
        return false;
    }
    if sim.match_state.selection.current_picker() != Some(player_id) {
        return false;
    }
    if !sim.match_state.selection.available.contains(&skill_id) {
        return false;
    }
    apply_pick(sim, player_id, skill_id);
    true
}

fn apply_pick(sim: &mut SimulationState, player_id: u32, skill_id: SkillId) {
    sim.match_state.assigned_skill.insert(player_id, skill_id);
    sim.match_state.selection.available.retain(|&s| s != skill_id);
    if sim.match_state.selection.available.is_empty() {
        sim.match_state.selection.available = SkillId::ALL.to_vec();
    }
    sim.match_state.selection.advance();
    if sim.match_state.selection.is_complete() {
        start_active(sim);
    } else {
        sim.match_state.selection.turn_deadline_ms = sim.elapsed_ms() + SELECTION_TURN_SECS as u64 * 1000;
    }
}

/// Auto-picks uniformly from the available set for the current picker if
/// their 30 s turn deadline has elapsed. Fires at most once per call; the
/// scheduler calls this every physics tick during `SkillSelection`.
pub fn check_selection_timeout(sim: &mut SimulationState, rng: &mut impl Rng) -> Option<(u32, SkillId)> {
    if sim.match_state.status != MatchStatus::SkillSelection {
        return None;
    }
    if sim.elapsed_ms() < sim.match_state.selection.turn_deadline_ms {
        return None;
    }
    let picker = sim.match_state.selection.current_picker()?;
    let available = &sim.match_state.selection.available;
    if available.is_empty() {
        return None;
    }
    let skill = *available.choose(rng).unwrap();
    apply_pick(sim, picker, skill);
    Some((picker, skill))
}

fn start_active(sim: &mut SimulationState) {
    sim.match_state.status = MatchStatus::Active;
    sim.match_state.clock_secs_remaining = GAME_DURATION_SECS;
    sim.match_state.in_overtime = false;
}

/// Decrements the match clock by one second (called once per elapsed
/// wall-clock second while `Active`). Enters overtime on a tied score at
/// zero; otherwise returns `Some(GameEndResult)` once the match actually
/// ends (either a decisive regulation result, or overtime expiring).
pub fn tick_clock(
    sim: &mut SimulationState,
    repo: &dyn StatsRepository,
    win_streaks: &std::collections::HashMap<u32, u32>,
) -> Option<GameEndResult> {
    if sim.match_state.status != MatchStatus::Active {
        return None;
    }
    if sim.match_state.clock_secs_remaining == 0 {
        return None;
    }
    sim.match_state.clock_secs_remaining -= 1;
    if sim.match_state.clock_secs_remaining > 0 {
        return None;
    }

    if !sim.match_state.in_overtime && sim.match_state.score.red == sim.match_state.score.blue {
        sim.match_state.in_overtime = true;
        sim.match_state.clock_secs_remaining = OVERTIME_SECS;
        return None;
    }

    Some(settle_game_end(sim, repo, win_streaks))
}

fn settle_game_end(
    sim: &mut SimulationState,
    repo: &dyn StatsRepository,
    win_streaks: &std::collections::HashMap<u32, u32>,
) -> GameEndResult {
    let winner = match sim.match_state.score.red.cmp(&sim.match_state.score.blue) {
        std::cmp::Ordering::Greater => Team::Red,
        std::cmp::Ordering::Less => Team::Blue,
        std::cmp::Ordering::Equal => Team::None,
    };
    let mvp_player_id = sim.match_state.mvp().map(|(id, _)| id);

    let mut mmr_updates = Vec::new();
    for (&id, stats) in &sim.match_state.stats {
        let Some(profile) = repo.load(id) else { continue };
        let team = sim.match_state.teams.get(&id).copied().unwrap_or(Team::Spectator);
        let won = team == winner;
        let streak = win_streaks.get(&id).copied().unwrap_or(0);
        let is_mvp = mvp_player_id == Some(id);
        let mut update = compute_mmr_delta(profile.mmr, stats, won, streak, is_mvp);
        update.player_id = id;
        repo.save(
            id,
            PlayerProfile { stats: profile.stats, mmr: update.new_mmr, win_streak: if won { streak + 1 } else { 0 } },
        );
        mmr_updates.push(update);
    }

    reset_for_next_match(sim);
    GameEndResult { winner, mvp_player_id, mmr_updates }
}

/// Clears match-scoped state back to a fresh lobby, cancelling every
/// skill timer (§5 cancellation guarantee) without disconnecting anyone.
pub fn reset_for_next_match(sim: &mut SimulationState) {
    sim.match_state = shared::match_state::MatchState::new_lobby();
    for state in sim.skills.values_mut() {
        state.clear();
    }
    sim.ball = shared::BallState::at_center();
    sim.pending_goal_reset_tick = None;
}
