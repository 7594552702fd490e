//! Skill activation and timer-driven expiry. One `match` over
//! `shared::skills::SkillEffect` (§9's tagged-variant redesign direction)
//! replaces per-skill branching; cooldowns and active-effect windows are
//! tracked in tick units so a test can step the scheduler deterministically
//! instead of depending on wall-clock timers.

use std::collections::HashMap;

use shared::entities::Team;
use shared::kernel::FIXED_DT_MS;
use shared::skills::{SkillEffect, SkillId};
use shared::world;

use crate::simulation::SimulationState;

/// Per-player skill bookkeeping: when each skill becomes usable again, and
/// which effects are currently active (expressed as an expiry tick, `None`
/// meaning inactive).
#[derive(Debug, Default, Clone)]
pub struct PlayerSkillState {
    pub next_usable_tick: HashMap<SkillId, u64>,
    pub slowed_until_tick: Option<u64>,
    pub metavision_until_tick: Option<u64>,
    pub ninja_step_on: bool,
    pub lurking_armed_until_tick: Option<u64>,
    pub power_shot_until_tick: Option<u64>,
    pub kick_power_buff_until_tick: Option<u64>,
}

impl PlayerSkillState {
    pub fn is_on_cooldown(&self, skill: SkillId, now_tick: u64) -> bool {
        self.next_usable_tick.get(&skill).is_some_and(|&t| now_tick < t)
    }

    pub fn is_slowed(&self, now_tick: u64) -> bool {
        self.slowed_until_tick.is_some_and(|t| now_tick < t)
    }

    pub fn has_metavision(&self, now_tick: u64) -> bool {
        self.metavision_until_tick.is_some_and(|t| now_tick < t)
    }

    pub fn has_power_shot(&self, now_tick: u64) -> bool {
        self.power_shot_until_tick.is_some_and(|t| now_tick < t)
    }

    pub fn has_kick_power_buff(&self, now_tick: u64) -> bool {
        self.kick_power_buff_until_tick.is_some_and(|t| now_tick < t)
    }

    /// Clears every active effect and cooldown — used on disconnect and on
    /// game reset so stale timers never fire against a departed or
    /// recycled player (§5 cancellation guarantee).
    pub fn clear(&mut self) {
        *self = PlayerSkillState::default();
    }
}

fn ms_to_ticks(ms: u64) -> u64 {
    ms.div_ceil(FIXED_DT_MS)
}

/// Outcome of an activation attempt, used by the caller to decide which
/// broadcast events to emit.
pub enum ActivationOutcome {
    Rejected,
    Activated,
    /// The second lurking activation resolved into a teleport-to-ball.
    LurkingTriggered,
}

/// Validates and applies a skill activation. Ownership rules: during
/// selection/active only the player's assigned skill may be used; in lobby
/// all skills are free (§4.H).
pub fn activate(
    sim: &mut SimulationState,
    player_id: u32,
    skill_id: SkillId,
    facing_direction: Option<f64>,
) -> ActivationOutcome {
    use shared::match_state::MatchStatus;

    let gated = sim.match_state.status != MatchStatus::Lobby;
    if gated && sim.match_state.assigned_skill.get(&player_id) != Some(&skill_id) {
        return ActivationOutcome::Rejected;
    }

    let now = sim.tick;
    let Some(state) = sim.skills.get(&player_id) else {
        return ActivationOutcome::Rejected;
    };

    // Lurking's second activation (teleport) does not re-check the skill's
    // own cooldown — it consumes the already-armed window instead.
    if skill_id == SkillId::LurkingRadius && state.lurking_armed_until_tick.is_some_and(|t| now < t) {
        return trigger_lurking(sim, player_id, now);
    }

    if state.is_on_cooldown(skill_id, now) {
        return ActivationOutcome::Rejected;
    }

    let Some(player) = sim.players.get(&player_id) else {
        return ActivationOutcome::Rejected;
    };
    if player.is_spectator() && gated {
        return ActivationOutcome::Rejected;
    }

    let effect = SkillEffect::for_skill(skill_id);
    let next_usable = now + ms_to_ticks(skill_id.cooldown_ms());
    let state = sim.skills.get_mut(&player_id).unwrap();
    state.next_usable_tick.insert(skill_id, next_usable);

    match effect {
        SkillEffect::SpeedSlow { .. } => {
            let until = now + ms_to_ticks(skill_id.duration_ms());
            for (&id, other) in sim.skills.iter_mut() {
                if id != player_id {
                    other.slowed_until_tick = Some(until);
                }
            }
            // The ongoing 0.35x multiplier (applied each integration in
            // `collision::step1_integrate_players`) only slows future
            // movement; the trigger itself also snaps every other active
            // player's current velocity down to 35%.
            for (&id, player) in sim.players.iter_mut() {
                if id != player_id && !player.is_spectator() {
                    player.vx *= 0.35;
                    player.vy *= 0.35;
                }
            }
        }
        SkillEffect::Blink { dist, prevent_clip } => {
            let facing = facing_direction.unwrap_or(0.0);
            let player = sim.players.get_mut(&player_id).unwrap();
            let target_x = player.x + facing.cos() * dist;
            let target_y = player.y + facing.sin() * dist;
            let blocked = prevent_clip && player.is_spectator() && blocked_by_wall(sim, target_x, target_y);
            if !blocked {
                let player = sim.players.get_mut(&player_id).unwrap();
                player.x = target_x.clamp(shared::kernel::PLAYER_RADIUS, shared::kernel::PITCH_WIDTH - shared::kernel::PLAYER_RADIUS);
                player.y = target_y.clamp(shared::kernel::PLAYER_RADIUS, shared::kernel::PITCH_HEIGHT - shared::kernel::PLAYER_RADIUS);
                player.vx = 0.0;
                player.vy = 0.0;
            }
        }
        SkillEffect::Metavision => {
            let state = sim.skills.get_mut(&player_id).unwrap();
            state.metavision_until_tick = Some(now + ms_to_ticks(skill_id.duration_ms()));
        }
        SkillEffect::NinjaStep => {
            let state = sim.skills.get_mut(&player_id).unwrap();
            state.ninja_step_on = !state.ninja_step_on;
        }
        SkillEffect::Lurking { duration_ms, .. } => {
            let state = sim.skills.get_mut(&player_id).unwrap();
            state.lurking_armed_until_tick = Some(now + ms_to_ticks(duration_ms));
        }
        SkillEffect::PowerShot { force, window_ms, .. } => {
            let team = sim.players[&player_id].team;
            let goal_x = world::opponent_goal_x(team);
            let goal_y = world::POWER_SHOT_GOAL_Y;
            let kick_power_mul = shared::kernel::kick_power_mul(sim.players[&player_id].stats.kick_power);
            let (px, py) = (sim.players[&player_id].x, sim.players[&player_id].y);
            let dx = goal_x - px;
            let dy = goal_y - py;
            let len = (dx * dx + dy * dy).sqrt().max(1e-9);
            sim.ball.vx = dx / len * force * kick_power_mul;
            sim.ball.vy = dy / len * force * kick_power_mul;
            sim.ball.kick_sequence += 1;
            sim.ball.moving = true;
            sim.ball.last_touch_timestamp = sim.elapsed_ms();
            sim.ball.previous_touch_id = sim.ball.last_touch_id;
            sim.ball.last_touch_id = Some(player_id);

            let recoil = 400.0;
            let player = sim.players.get_mut(&player_id).unwrap();
            player.vx -= dx / len * recoil;
            player.vy -= dy / len * recoil;

            let state = sim.skills.get_mut(&player_id).unwrap();
            state.power_shot_until_tick = Some(now + ms_to_ticks(window_ms));
            state.kick_power_buff_until_tick = Some(now + ms_to_ticks(window_ms));
        }
    }

    ActivationOutcome::Activated
}

fn trigger_lurking(sim: &mut SimulationState, player_id: u32, now: u64) -> ActivationOutcome {
    let radius = 500.0;
    let Some(player) = sim.players.get(&player_id) else {
        return ActivationOutcome::Rejected;
    };
    let dx = sim.ball.x - player.x;
    let dy = sim.ball.y - player.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let state = sim.skills.get_mut(&player_id).unwrap();
    state.lurking_armed_until_tick = None;
    if dist > radius {
        return ActivationOutcome::Rejected;
    }

    let team = sim.players[&player_id].team;
    let attacking_dir = match team {
        Team::Red => 1.0,
        _ => -1.0,
    };
    let offset = shared::skills::LURKING_TELEPORT_OFFSET * attacking_dir;
    let player = sim.players.get_mut(&player_id).unwrap();
    player.x = (sim.ball.x + offset).clamp(shared::kernel::PLAYER_RADIUS, shared::kernel::PITCH_WIDTH - shared::kernel::PLAYER_RADIUS);
    player.y = sim.ball.y.clamp(shared::kernel::PLAYER_RADIUS, shared::kernel::PITCH_HEIGHT - shared::kernel::PLAYER_RADIUS);

    sim.ball.vx = 0.0;
    sim.ball.vy = 0.0;
    sim.ball.moving = false;
    sim.ball.previous_touch_id = sim.ball.last_touch_id;
    sim.ball.last_touch_id = Some(player_id);
    sim.ball.last_touch_timestamp = now * FIXED_DT_MS;

    ActivationOutcome::LurkingTriggered
}

fn blocked_by_wall(_sim: &SimulationState, _x: f64, _y: f64) -> bool {
    // No interior colliders in the default pitch; a real deployment checks
    // `StaticWorld::collisions` here. Kept as an explicit seam rather than
    // folded into the caller so adding collider checks doesn't touch the
    // blink activation logic above.
    false
}

/// Drains every expired effect and armed-but-unused lurking window at or
/// before `now_tick`, clearing the corresponding flag, and returns the
/// `(player_id, skill_id)` pairs that just ended so the caller can emit
/// `SoccerSkillEnded` for each (§4.H/§4.I — expiry is edge-triggered).
pub fn expire_effects(sim: &mut SimulationState, now_tick: u64) -> Vec<(u32, SkillId)> {
    let mut ended = Vec::new();
    for (&id, state) in sim.skills.iter_mut() {
        if state.slowed_until_tick.is_some_and(|t| now_tick >= t) {
            state.slowed_until_tick = None;
            ended.push((id, SkillId::Slowdown));
        }
        if state.metavision_until_tick.is_some_and(|t| now_tick >= t) {
            state.metavision_until_tick = None;
            ended.push((id, SkillId::Metavision));
        }
        if state.lurking_armed_until_tick.is_some_and(|t| now_tick >= t) {
            state.lurking_armed_until_tick = None;
            ended.push((id, SkillId::LurkingRadius));
        }
        if state.power_shot_until_tick.is_some_and(|t| now_tick >= t) {
            state.power_shot_until_tick = None;
            ended.push((id, SkillId::PowerShot));
        }
        if state.kick_power_buff_until_tick.is_some_and(|t| now_tick >= t) {
            state.kick_power_buff_until_tick = None;
        }
    }
    ended
}
