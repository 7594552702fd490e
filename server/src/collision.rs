//! The ordered ten-step collision and goal resolver. Generalizes the
//! teacher's `GameState::handle_collisions`
//! (`jakobhuuse-Netcode-in-Rust/server/src/game.rs`, pairwise AABB over a
//! `HashMap` via clone-mutate-reinsert) from two-body platformer collision
//! to player-player/player-ball/ball-rect/goal resolution.

use std::collections::HashMap;

use shared::entities::InputState;
use shared::kernel::{self, drag_mul, speed_mul};
use shared::world::StaticWorld;

use crate::simulation::SimulationState;

const PLAYER_PUSH_IMPULSE: f64 = 150.0;
const BALL_KNOCKBACK_THRESHOLD: f64 = 100.0;
const BALL_KNOCKBACK_CAP: f64 = 200.0;
const BALL_KNOCKBACK_SCALE: f64 = 0.6;
const BALL_PLAYER_RETENTION: f64 = 0.6;
const BALL_SETTLE_SPEED: f64 = 10.0;

/// Advances collision/goal resolution by one physics step, in the order
/// mandated by the design: player integration, player-player, player-ball
/// knockback, ball integration, ball-player, ball-rect, ball-goal,
/// boundary clamp, settle, spectator-vs-wall.
pub fn resolve_step(sim: &mut SimulationState, world: &StaticWorld, inputs: &HashMap<u32, InputState>, dt: f64) {
    step1_integrate_players(sim, inputs, dt);
    step2_player_player(sim);
    step3_player_ball_knockback(sim);
    step4_integrate_ball(sim, dt);
    step5_ball_player(sim);
    step6_ball_rect(sim, world);
    step7_ball_goal(sim, world);
    step8_clamp_ball(sim);
    step9_settle_ball(sim);
    step10_spectator_walls(sim, world);
}

fn step1_integrate_players(sim: &mut SimulationState, inputs: &HashMap<u32, InputState>, dt: f64) {
    let now = sim.tick;
    let empty = InputState::default();
    for (&id, player) in sim.players.iter_mut() {
        let input = inputs.get(&id).unwrap_or(&empty);
        let mut s_mul = speed_mul(player.stats.speed);
        if sim.skills.get(&id).is_some_and(|s| s.is_slowed(now)) {
            s_mul *= 0.35;
        }
        let d_mul = drag_mul(player.stats.dribbling);
        kernel::integrate_player(player, input, dt, d_mul, s_mul);
    }
}

fn collidable_pair(sim: &SimulationState, a: u32, b: u32) -> bool {
    let pa = &sim.players[&a];
    let pb = &sim.players[&b];
    if pa.is_spectator() || pb.is_spectator() {
        return false;
    }
    let now = sim.tick;
    let near_ball = |id: u32| -> bool {
        let p = &sim.players[&id];
        let dx = p.x - sim.ball.x;
        let dy = p.y - sim.ball.y;
        (dx * dx + dy * dy).sqrt() < kernel::PLAYER_RADIUS + kernel::BALL_RADIUS + 20.0
    };
    let phased_a = sim.skills.get(&a).is_some_and(|s| s.ninja_step_on) && !near_ball(a);
    let phased_b = sim.skills.get(&b).is_some_and(|s| s.ninja_step_on) && !near_ball(b);
    !phased_a && !phased_b
}

fn step2_player_player(sim: &mut SimulationState) {
    let ids: Vec<u32> = sim.players.keys().copied().collect();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let (a, b) = (ids[i], ids[j]);
            if !collidable_pair(sim, a, b) {
                continue;
            }
            let (ax, ay) = (sim.players[&a].x, sim.players[&a].y);
            let (bx, by) = (sim.players[&b].x, sim.players[&b].y);
            let dx = bx - ax;
            let dy = by - ay;
            let dist = (dx * dx + dy * dy).sqrt();
            let min_dist = kernel::PLAYER_RADIUS * 2.0;
            if dist >= min_dist || dist < 1e-9 {
                continue;
            }
            let nx = dx / dist;
            let ny = dy / dist;
            let overlap = min_dist - dist;
            let sep = overlap / 2.0;

            let pa = sim.players.get_mut(&a).unwrap();
            pa.x -= nx * sep;
            pa.y -= ny * sep;
            pa.vx -= nx * PLAYER_PUSH_IMPULSE;
            pa.vy -= ny * PLAYER_PUSH_IMPULSE;

            let pb = sim.players.get_mut(&b).unwrap();
            pb.x += nx * sep;
            pb.y += ny * sep;
            pb.vx += nx * PLAYER_PUSH_IMPULSE;
            pb.vy += ny * PLAYER_PUSH_IMPULSE;
        }
    }
}

fn step3_player_ball_knockback(sim: &mut SimulationState) {
    if sim.ball.speed() <= BALL_KNOCKBACK_THRESHOLD {
        return;
    }
    let ball_speed = sim.ball.speed();
    let ids: Vec<u32> = sim.players.keys().copied().collect();
    for id in ids {
        let player = &sim.players[&id];
        if player.is_spectator() {
            continue;
        }
        let dx = player.x - sim.ball.x;
        let dy = player.y - sim.ball.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist >= kernel::PLAYER_RADIUS + kernel::BALL_RADIUS || dist < 1e-9 {
            continue;
        }
        let knockback = if sim.skills.get(&id).is_some_and(|s| s.has_power_shot(sim.tick)) {
            300.0
        } else {
            (ball_speed * BALL_KNOCKBACK_SCALE).min(BALL_KNOCKBACK_CAP)
        };
        let nx = dx / dist;
        let ny = dy / dist;
        let player = sim.players.get_mut(&id).unwrap();
        player.vx += nx * knockback;
        player.vy += ny * knockback;
    }
}

fn step4_integrate_ball(sim: &mut SimulationState, dt: f64) {
    kernel::integrate_ball(&mut sim.ball, dt);
}

fn step5_ball_player(sim: &mut SimulationState) {
    sim.pending_interception = None;
    let ids: Vec<u32> = sim.players.keys().copied().collect();
    for id in ids {
        let player = &sim.players[&id];
        if player.is_spectator() {
            continue;
        }
        let dx = sim.ball.x - player.x;
        let dy = sim.ball.y - player.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let min_dist = kernel::BALL_RADIUS + kernel::PLAYER_RADIUS;
        if dist >= min_dist || dist < 1e-9 {
            continue;
        }
        let retention = if sim.skills.get(&id).is_some_and(|s| s.has_power_shot(sim.tick)) { 0.8 } else { BALL_PLAYER_RETENTION };
        let nx = dx / dist;
        let ny = dy / dist;
        // Reflect ball velocity about the ball->player normal.
        let dot = sim.ball.vx * nx + sim.ball.vy * ny;
        sim.ball.vx = (sim.ball.vx - 2.0 * dot * nx) * retention;
        sim.ball.vy = (sim.ball.vy - 2.0 * dot * ny) * retention;
        let overlap = min_dist - dist;
        sim.ball.x -= nx * (overlap + 1.0);
        sim.ball.y -= ny * (overlap + 1.0);

        let previous = sim.ball.last_touch_id;
        if previous != Some(id) {
            sim.ball.previous_touch_id = previous;
        }
        if let Some(prev_id) = previous {
            if prev_id != id {
                if let Some(prev_player) = sim.players.get(&prev_id) {
                    let prev_team = prev_player.team;
                    if prev_team != sim.players[&id].team {
                        sim.match_state.stats_for(id).interceptions += 1;
                        sim.pending_interception = Some((id, prev_team));
                    }
                }
            }
        }
        sim.ball.last_touch_id = Some(id);
        sim.ball.last_touch_timestamp = sim.elapsed_ms();
        // Only the first contact this step counts (discrete, first-contact-only).
        break;
    }
}

fn step6_ball_rect(sim: &mut SimulationState, world: &StaticWorld) {
    for rect in &world.collisions {
        let (cx, cy) = rect.closest_point(sim.ball.x, sim.ball.y);
        let dx = sim.ball.x - cx;
        let dy = sim.ball.y - cy;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist >= kernel::BALL_RADIUS || dist < 1e-9 {
            continue;
        }
        let nx = dx / dist;
        let ny = dy / dist;
        let dot = sim.ball.vx * nx + sim.ball.vy * ny;
        sim.ball.vx = (sim.ball.vx - 2.0 * dot * nx) * kernel::BALL_BOUNCE;
        sim.ball.vy = (sim.ball.vy - 2.0 * dot * ny) * kernel::BALL_BOUNCE;
        let penetration = kernel::BALL_RADIUS - dist;
        sim.ball.x += nx * (penetration + 1.0);
        sim.ball.y += ny * (penetration + 1.0);
        break;
    }
}

fn step7_ball_goal(sim: &mut SimulationState, world: &StaticWorld) {
    if sim.pending_goal_reset_tick.is_some() {
        return;
    }
    for goal in &world.goals {
        if !goal.contains(sim.ball.x, sim.ball.y) {
            continue;
        }
        let scoring_team = match goal.team {
            shared::entities::Team::Red => shared::entities::Team::Blue,
            shared::entities::Team::Blue => shared::entities::Team::Red,
            other => other,
        };
        match scoring_team {
            shared::entities::Team::Red => sim.match_state.score.red += 1,
            shared::entities::Team::Blue => sim.match_state.score.blue += 1,
            _ => {}
        }
        if let Some(scorer) = sim.ball.last_touch_id {
            sim.match_state.stats_for(scorer).goals += 1;
            if let Some(assister) = sim.ball.previous_touch_id {
                if assister != scorer && sim.players.get(&assister).map(|p| p.team) == sim.players.get(&scorer).map(|p| p.team) {
                    sim.match_state.stats_for(assister).assists += 1;
                }
            }
        }
        sim.ball.vx = 0.0;
        sim.ball.vy = 0.0;
        sim.ball.moving = false;
        // 3 simulation-seconds from now, at the fixed 16 ms tick rate.
        sim.pending_goal_reset_tick = Some(sim.tick + (3000 / shared::kernel::FIXED_DT_MS));
        break;
    }
}

fn step8_clamp_ball(sim: &mut SimulationState) {
    let (min, max) = (kernel::BALL_RADIUS, kernel::PITCH_WIDTH - kernel::BALL_RADIUS);
    if sim.ball.x < min {
        sim.ball.x = min;
        sim.ball.vx = sim.ball.vx.abs() * kernel::BALL_BOUNCE;
    }
    if sim.ball.x > max {
        sim.ball.x = max;
        sim.ball.vx = -sim.ball.vx.abs() * kernel::BALL_BOUNCE;
    }
    let (min, max) = (kernel::BALL_RADIUS, kernel::PITCH_HEIGHT - kernel::BALL_RADIUS);
    if sim.ball.y < min {
        sim.ball.y = min;
        sim.ball.vy = sim.ball.vy.abs() * kernel::BALL_BOUNCE;
    }
    if sim.ball.y > max {
        sim.ball.y = max;
        sim.ball.vy = -sim.ball.vy.abs() * kernel::BALL_BOUNCE;
    }
}

fn step9_settle_ball(sim: &mut SimulationState) {
    if sim.ball.speed() < BALL_SETTLE_SPEED {
        sim.ball.vx = 0.0;
        sim.ball.vy = 0.0;
        sim.ball.moving = false;
    }
}

fn step10_spectator_walls(sim: &mut SimulationState, world: &StaticWorld) {
    let ids: Vec<u32> = sim.players.iter().filter(|(_, p)| p.is_spectator()).map(|(&id, _)| id).collect();
    for id in ids {
        for rect in &world.collisions {
            let player = &sim.players[&id];
            let (cx, cy) = rect.closest_point(player.x, player.y);
            let dx = player.x - cx;
            let dy = player.y - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist >= kernel::PLAYER_RADIUS || dist < 1e-9 {
                continue;
            }
            let nx = dx / dist;
            let ny = dy / dist;
            let penetration = kernel::PLAYER_RADIUS - dist;
            let player = sim.players.get_mut(&id).unwrap();
            if nx.abs() > ny.abs() {
                player.x += nx.signum() * penetration;
                player.vx = 0.0;
            } else {
                player.y += ny.signum() * penetration;
                player.vy = 0.0;
            }
        }
    }
}
