//! Kick/dribble validation, generalizing the teacher's
//! `network::handle_packet` validate-then-apply shape
//! (`jakobhuuse-Netcode-in-Rust/server/src/network.rs`) from plain
//! connect/input handling to the distance/cooldown/lag-compensation rules
//! in §4.F.

use shared::entities::Team;
use shared::kernel::{kick_power_mul, kick_velocity, FIXED_DT_MS};
use shared::skills::{BASE_KICK_DISTANCE, METAVISION_KICK_DISTANCE};

use crate::simulation::SimulationState;

pub const KICK_COOLDOWN_MS: u64 = 300;
pub const MAX_DRIBBLE_DISTANCE: f64 = 300.0;
pub const DRIBBLE_SPEED: f64 = 300.0;
pub const KICK_RECOIL: f64 = 400.0;
pub const MIN_KICK_DRIBBLE_GAP_MS: u64 = 100;
pub const LAG_COMP_WINDOW_MS: u64 = 500;

fn ms_to_ticks(ms: u64) -> u64 {
    ms.div_ceil(FIXED_DT_MS)
}

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Resolves the kicker/ball position used for distance validation: if a
/// `client_tick` hint is supplied and within the lag-comp window, rewind to
/// history; otherwise use the current authoritative position (§4.F, §9
/// "client clock trust").
fn validation_position(sim: &SimulationState, player_id: u32, client_timestamp_ms: Option<u64>) -> ((f64, f64), (f64, f64)) {
    let now_ms = sim.elapsed_ms();
    let player = &sim.players[&player_id];
    let current_player_pos = (player.x, player.y);
    let current_ball_pos = (sim.ball.x, sim.ball.y);

    let Some(ts) = client_timestamp_ms else {
        return (current_player_pos, current_ball_pos);
    };
    if now_ms.saturating_sub(ts) > LAG_COMP_WINDOW_MS {
        return (current_player_pos, current_ball_pos);
    }

    let player_pos = sim
        .player_history
        .get(&player_id)
        .and_then(|h| h.closest(ts))
        .map(|s| (s.x, s.y))
        .unwrap_or(current_player_pos);
    let ball_pos = sim.ball_history.closest(ts).map(|s| (s.x, s.y)).unwrap_or(current_ball_pos);
    (player_pos, ball_pos)
}

/// Attempts a kick. Returns `true` and mutates the ball/kicker on success;
/// `false` (silent drop, §7) otherwise.
pub fn try_kick(sim: &mut SimulationState, player_id: u32, angle: f64, base_power: f64, client_timestamp_ms: Option<u64>) -> bool {
    let Some(player) = sim.players.get(&player_id) else {
        return false;
    };
    if player.is_spectator() {
        return false;
    }

    let now_tick = sim.tick;
    if let Some(&last) = sim.last_kick_tick.get(&player_id) {
        if now_tick.saturating_sub(last) < ms_to_ticks(KICK_COOLDOWN_MS) {
            return false;
        }
    }

    let metavision = sim.skills.get(&player_id).is_some_and(|s| s.has_metavision(now_tick));
    let max_distance = if metavision { METAVISION_KICK_DISTANCE } else { BASE_KICK_DISTANCE };

    let ((px, py), (bx, by)) = validation_position(sim, player_id, client_timestamp_ms);
    if distance(px, py, bx, by) > max_distance {
        return false;
    }

    let kp_buffed = sim.skills.get(&player_id).is_some_and(|s| s.has_kick_power_buff(now_tick));
    let kick_power_stat = sim.players[&player_id].stats.kick_power.saturating_add(if kp_buffed { 5 } else { 0 });
    let (vx, vy) = kick_velocity(angle, base_power, kick_power_mul(kick_power_stat), metavision);

    sim.ball.vx = vx;
    sim.ball.vy = vy;
    sim.ball.moving = true;
    sim.ball.kick_sequence += 1;
    sim.ball.previous_touch_id = sim.ball.last_touch_id;
    sim.ball.last_touch_id = Some(player_id);
    sim.ball.last_touch_timestamp = sim.elapsed_ms();

    let dir_len = (vx * vx + vy * vy).sqrt().max(1e-9);
    let player = sim.players.get_mut(&player_id).unwrap();
    player.vx -= vx / dir_len * KICK_RECOIL;
    player.vy -= vy / dir_len * KICK_RECOIL;

    sim.last_kick_tick.insert(player_id, now_tick);
    sim.last_dribble_or_kick_tick.insert(player_id, now_tick);
    true
}

/// Attempts a dribble. Rejected within 100 ms of any kick/dribble by the
/// same player, or if the server-observed distance to the ball exceeds
/// `MAX_DRIBBLE_DISTANCE`.
pub fn try_dribble(sim: &mut SimulationState, player_id: u32, player_x: f64, player_y: f64) -> bool {
    let Some(player) = sim.players.get(&player_id) else {
        return false;
    };
    if player.is_spectator() {
        return false;
    }

    let now_tick = sim.tick;
    if let Some(&last) = sim.last_dribble_or_kick_tick.get(&player_id) {
        if now_tick.saturating_sub(last) < ms_to_ticks(MIN_KICK_DRIBBLE_GAP_MS) {
            return false;
        }
    }

    if distance(player.x, player.y, sim.ball.x, sim.ball.y) > MAX_DRIBBLE_DISTANCE {
        return false;
    }
    let _ = (player_x, player_y); // client-reported position is advisory only; server trusts its own.

    let dx = sim.ball.x - player.x;
    let dy = sim.ball.y - player.y;
    let len = (dx * dx + dy * dy).sqrt().max(1e-9);
    sim.ball.vx = dx / len * DRIBBLE_SPEED;
    sim.ball.vy = dy / len * DRIBBLE_SPEED;
    sim.ball.moving = true;
    sim.ball.kick_sequence += 1;
    sim.ball.previous_touch_id = sim.ball.last_touch_id;
    sim.ball.last_touch_id = Some(player_id);
    sim.ball.last_touch_timestamp = sim.elapsed_ms();

    sim.last_dribble_or_kick_tick.insert(player_id, now_tick);
    true
}
