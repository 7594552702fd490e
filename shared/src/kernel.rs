//! Pure kinematic integration functions, shared byte-identically between the
//! authoritative server and any client running local prediction.
//!
//! Every constant here is authoritative — copy, never rederive. All math is
//! `f64` so that both endpoints agree bit-for-bit given identical inputs
//! (see the determinism rule at the bottom of this file).

use std::sync::OnceLock;

use crate::entities::{BallState, InputState, PlayerPhysics};

/// Pitch width, pixels.
pub const PITCH_WIDTH: f64 = 3520.0;
/// Pitch height, pixels.
pub const PITCH_HEIGHT: f64 = 1600.0;
/// Ball collision radius, pixels.
pub const BALL_RADIUS: f64 = 30.0;
/// Player collision radius, pixels.
pub const PLAYER_RADIUS: f64 = 30.0;
/// Exponential drag coefficient applied to the ball.
pub const BALL_DRAG: f64 = 1.0;
/// Exponential drag coefficient applied to players (before per-player
/// dribbling multiplier).
pub const PLAYER_DRAG: f64 = 4.0;
/// Base player acceleration, pixels/second², before stat multiplier.
pub const PLAYER_ACCEL: f64 = 1600.0;
/// Base player max speed, pixels/second, before stat multiplier.
pub const PLAYER_MAX_SPEED: f64 = 600.0;
/// Velocity retained (magnitude fraction) on a ball/wall bounce.
pub const BALL_BOUNCE: f64 = 0.7;
/// Fixed physics timestep, seconds.
pub const FIXED_DT: f64 = 0.016;
/// Fixed physics timestep, milliseconds (integer form used for tick/timer
/// bookkeeping).
pub const FIXED_DT_MS: u64 = 16;

/// `exp(-BALL_DRAG * FIXED_DT)`, memoized because `dt` never varies and
/// `exp` is not a `const fn` on stable Rust.
fn ball_drag_factor() -> f64 {
    static CACHE: OnceLock<f64> = OnceLock::new();
    *CACHE.get_or_init(|| (-BALL_DRAG * FIXED_DT).exp())
}

/// Integrates the ball one fixed timestep:
/// 1. scale velocity by the exponential drag factor,
/// 2. add `v*dt` to position,
/// 3. clamp to the pitch interior in order left, right, top, bottom,
///    reflecting the corresponding velocity component on each clamp.
///
/// Clamping order matters: a corner case against two edges at once is
/// resolved by letting later clamps win, matching the documented order.
pub fn integrate_ball(ball: &mut BallState, dt: f64) {
    let drag = if dt == FIXED_DT {
        ball_drag_factor()
    } else {
        (-BALL_DRAG * dt).exp()
    };
    ball.vx *= drag;
    ball.vy *= drag;

    ball.x += ball.vx * dt;
    ball.y += ball.vy * dt;

    let (min, max) = (BALL_RADIUS, PITCH_WIDTH - BALL_RADIUS);
    if ball.x < min {
        ball.x = min;
        ball.vx = ball.vx.abs() * BALL_BOUNCE;
    }
    if ball.x > max {
        ball.x = max;
        ball.vx = -ball.vx.abs() * BALL_BOUNCE;
    }
    let (min, max) = (BALL_RADIUS, PITCH_HEIGHT - BALL_RADIUS);
    if ball.y < min {
        ball.y = min;
        ball.vy = ball.vy.abs() * BALL_BOUNCE;
    }
    if ball.y > max {
        ball.y = max;
        ball.vy = -ball.vy.abs() * BALL_BOUNCE;
    }
}

/// Integrates one player one fixed timestep against a single input sample.
///
/// `drag_mul` and `speed_mul` fold in the player's stat multipliers (and,
/// for `speed_mul`, any transient slow-effect multiplier) so this function
/// stays a pure arithmetic pipeline with no knowledge of skills.
///
/// Order: accelerate from input, apply drag, clamp to max speed, integrate
/// position, clamp to pitch (zeroing the matching velocity component on
/// clamp — unlike the ball, players do not bounce off walls).
pub fn integrate_player(player: &mut PlayerPhysics, input: &InputState, dt: f64, drag_mul: f64, speed_mul: f64) {
    let accel = PLAYER_ACCEL * speed_mul;
    let max_speed = PLAYER_MAX_SPEED * speed_mul;

    if input.up {
        player.vy -= accel * dt;
    }
    if input.down {
        player.vy += accel * dt;
    }
    if input.left {
        player.vx -= accel * dt;
    }
    if input.right {
        player.vx += accel * dt;
    }

    let drag = (-PLAYER_DRAG * drag_mul * dt).exp();
    player.vx *= drag;
    player.vy *= drag;

    let speed = (player.vx * player.vx + player.vy * player.vy).sqrt();
    if speed > max_speed && speed > 0.0 {
        let scale = max_speed / speed;
        player.vx *= scale;
        player.vy *= scale;
    }

    player.x += player.vx * dt;
    player.y += player.vy * dt;

    let (min, max) = (PLAYER_RADIUS, PITCH_WIDTH - PLAYER_RADIUS);
    if player.x < min {
        player.x = min;
        player.vx = 0.0;
    }
    if player.x > max {
        player.x = max;
        player.vx = 0.0;
    }
    let (min, max) = (PLAYER_RADIUS, PITCH_HEIGHT - PLAYER_RADIUS);
    if player.y < min {
        player.y = min;
        player.vy = 0.0;
    }
    if player.y > max {
        player.y = max;
        player.vy = 0.0;
    }
}

/// `speedMul = 1 + 0.1*speed`.
pub fn speed_mul(speed_stat: u8) -> f64 {
    1.0 + 0.1 * speed_stat as f64
}

/// `kickPowerMul = 1 + 0.1*kickPower`.
pub fn kick_power_mul(kick_power_stat: u8) -> f64 {
    1.0 + 0.1 * kick_power_stat as f64
}

/// `dragMul = max(0.5, 1 - 0.05*dribbling)`.
pub fn drag_mul(dribbling_stat: u8) -> f64 {
    (1.0 - 0.05 * dribbling_stat as f64).max(0.5)
}

/// Kick velocity vector for an angle (radians) and base power, scaled by the
/// kicker's kick-power multiplier and, if metavision is active, an
/// additional 1.2x.
pub fn kick_velocity(angle: f64, base_power: f64, kick_power_mul: f64, metavision: bool) -> (f64, f64) {
    let mut power = base_power * kick_power_mul;
    if metavision {
        power *= 1.2;
    }
    (angle.cos() * power, angle.sin() * power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn still_ball(x: f64, y: f64, vx: f64, vy: f64) -> BallState {
        BallState {
            x,
            y,
            vx,
            vy,
            moving: vx != 0.0 || vy != 0.0,
            last_touch_id: None,
            previous_touch_id: None,
            last_touch_timestamp: 0,
            kick_sequence: 0,
        }
    }

    #[test]
    fn ball_drag_reduces_speed_each_tick() {
        let mut ball = still_ball(1760.0, 800.0, 600.0, 0.0);
        let before = ball.vx.abs();
        integrate_ball(&mut ball, FIXED_DT);
        assert!(ball.vx.abs() < before);
    }

    #[test]
    fn ball_boundary_closure_and_bounce() {
        let mut ball = still_ball(BALL_RADIUS + 1.0, 800.0, -5000.0, 0.0);
        integrate_ball(&mut ball, FIXED_DT);
        assert!(ball.x >= BALL_RADIUS - 1e-9);
        assert!(ball.vx > 0.0, "ball should bounce off the left wall");
    }

    #[test]
    fn player_clamped_velocity_zeroed_on_wall() {
        let mut player = PlayerPhysics {
            id: 1,
            x: PLAYER_RADIUS + 1.0,
            y: 800.0,
            vx: -5000.0,
            vy: 0.0,
            team: crate::entities::Team::Red,
            stats: crate::entities::PlayerStats::checked_new(5, 5, 5).unwrap(),
        };
        let input = InputState::default();
        integrate_player(&mut player, &input, FIXED_DT, 1.0, 1.0);
        assert!(player.x >= PLAYER_RADIUS - 1e-9);
        assert_eq!(player.vx, 0.0);
    }

    #[test]
    fn determinism_two_independent_runs_agree_bit_for_bit() {
        let inputs = [
            InputState { up: true, sequence: 1, ..Default::default() },
            InputState { right: true, sequence: 2, ..Default::default() },
            InputState { down: true, left: true, sequence: 3, ..Default::default() },
        ];
        let mut a = still_ball(1760.0, 800.0, 0.0, 0.0);
        let mut b = still_ball(1760.0, 800.0, 0.0, 0.0);
        let mut pa = PlayerPhysics {
            id: 1,
            x: 1000.0,
            y: 800.0,
            vx: 0.0,
            vy: 0.0,
            team: crate::entities::Team::Red,
            stats: crate::entities::PlayerStats::checked_new(5, 5, 5).unwrap(),
        };
        let mut pb = pa.clone();
        for input in &inputs {
            integrate_ball(&mut a, FIXED_DT);
            integrate_ball(&mut b, FIXED_DT);
            integrate_player(&mut pa, input, FIXED_DT, 1.0, 1.0);
            integrate_player(&mut pb, input, FIXED_DT, 1.0, 1.0);
        }
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.vx.to_bits(), b.vx.to_bits());
        assert_eq!(pa.x.to_bits(), pb.x.to_bits());
        assert_eq!(pa.vx.to_bits(), pb.vx.to_bits());
    }

    #[test]
    fn stat_multipliers_match_formulas() {
        assert_approx_eq!(speed_mul(5), 1.5, 1e-12);
        assert_approx_eq!(kick_power_mul(10), 2.0, 1e-12);
        assert_approx_eq!(drag_mul(20), 0.5, 1e-12);
        assert_approx_eq!(drag_mul(0), 1.0, 1e-12);
    }

    #[test]
    fn kick_velocity_applies_metavision_bonus() {
        let (vx, vy) = kick_velocity(0.0, 1000.0, 1.0, false);
        assert_approx_eq!(vx, 1000.0, 1e-9);
        assert_approx_eq!(vy, 0.0, 1e-9);
        let (vx_meta, _) = kick_velocity(0.0, 1000.0, 1.0, true);
        assert_approx_eq!(vx_meta, 1200.0, 1e-9);
    }
}
