//! End-to-end scenarios exercising the scheduler/collision/skill/
//! orchestrator pipeline together, in the spirit of the teacher's
//! `tests/integration_tests.rs`: each test drives a real `Scheduler`
//! through `step_once`/`handle_message` rather than calling into a single
//! module in isolation.

use std::sync::Arc;

use server::config::Config;
use server::orchestrator;
use server::persistence::InMemoryStatsRepository;
use server::room::{ChannelRoom, Room};
use server::scheduler::Scheduler;
use shared::entities::{PlayerStats, Team};
use shared::kernel;
use shared::protocol::{ClientMessage, ServerMessage};
use shared::skills::SkillId;
use shared::world::StaticWorld;

fn scheduler() -> Scheduler<ChannelRoom> {
    Scheduler::new(StaticWorld::default_pitch(), ChannelRoom::new(), Config::default(), Arc::new(InMemoryStatsRepository::new()))
}

/// 1. Stop from rest: a moving ball with no touches decays to a stop well
/// inside the distance an unbounded drag-free slide would cover.
#[test]
fn ball_stops_from_rest_within_five_seconds() {
    let mut sched = scheduler();
    sched.sim.ball.x = 1760.0;
    sched.sim.ball.y = 800.0;
    sched.sim.ball.vx = 600.0;
    sched.sim.ball.vy = 0.0;
    sched.sim.ball.moving = true;

    let steps = (5000.0 / kernel::FIXED_DT_MS as f64).ceil() as u32;
    for _ in 0..steps {
        sched.step_once();
    }

    assert!(sched.sim.ball.speed() < 10.0, "ball should have settled, got speed {}", sched.sim.ball.speed());
    assert!(!sched.sim.ball.moving);
    assert!(sched.sim.ball.x < 1760.0 + 600.0 / kernel::BALL_DRAG);
}

/// 2. Kick authority wins: a valid kick is accepted and bumps the kick
/// sequence; a second kick from the same player inside the cooldown window
/// is silently rejected.
#[test]
fn kick_authority_wins_and_cooldown_blocks_the_next_kick() {
    let mut sched = scheduler();
    sched.sim.add_player(1, PlayerStats::balanced());
    sched.sim.assign_team(1, Team::Red);
    sched.sim.ball.x = sched.sim.players[&1].x + 50.0;
    sched.sim.ball.y = sched.sim.players[&1].y;

    let before = sched.sim.ball.kick_sequence;
    sched.handle_message(
        1,
        ClientMessage::BallKick { player_id: 1, angle: 0.0, kick_power: 1000.0, timestamp: None, sequence: Some(42), local_kick_id: None },
    );
    assert_eq!(sched.sim.ball.kick_sequence, before + 1);
    let kick_power_mul = kernel::kick_power_mul(PlayerStats::balanced().kick_power);
    assert!((sched.sim.ball.vx - 1000.0 * kick_power_mul).abs() < 1e-6);

    sched.handle_message(
        1,
        ClientMessage::BallKick { player_id: 1, angle: 0.0, kick_power: 1000.0, timestamp: None, sequence: Some(43), local_kick_id: None },
    );
    assert_eq!(sched.sim.ball.kick_sequence, before + 1, "a kick within the cooldown window must not be accepted");
}

/// 3. Goal reset: pushing the ball into the red goal zone scores for blue,
/// and 3 simulated seconds later the ball and every on-pitch player are
/// back at their reset positions with the kick sequence bumped once more.
#[test]
fn goal_scored_resets_ball_and_players_after_three_seconds() {
    let mut sched = scheduler();
    sched.sim.add_player(1, PlayerStats::balanced());
    sched.sim.assign_team(1, Team::Blue);
    let mut outbound = sched.room.register_client(1);

    let red_goal = sched.world.goals.iter().find(|g| g.team == Team::Red).unwrap().clone();
    sched.sim.ball.x = red_goal.x + 1.0;
    sched.sim.ball.y = red_goal.y + 1.0;
    sched.sim.ball.vx = -10.0;
    sched.sim.ball.last_touch_id = Some(1);
    let kick_sequence_before_goal = sched.sim.ball.kick_sequence;

    sched.step_once();

    assert_eq!(sched.sim.match_state.score.blue, 1);
    assert!(sched.sim.pending_goal_reset_tick.is_some());
    let goal_scored = std::iter::from_fn(|| outbound.try_recv().ok()).any(|m| matches!(m, ServerMessage::GoalScored { scoring_team: Team::Blue, .. }));
    assert!(goal_scored, "expected a GoalScored broadcast for the scoring team");

    for _ in 0..(3000 / kernel::FIXED_DT_MS as u32 + 1) {
        sched.step_once();
    }

    assert!(sched.sim.pending_goal_reset_tick.is_none());
    assert_eq!(sched.sim.ball.x, kernel::PITCH_WIDTH / 2.0);
    assert_eq!(sched.sim.ball.y, kernel::PITCH_HEIGHT / 2.0);
    assert_eq!(sched.sim.ball.vx, 0.0);
    assert_eq!(sched.sim.ball.vy, 0.0);
    assert_eq!(sched.sim.ball.kick_sequence, kick_sequence_before_goal + 1, "the reset bumps the kick sequence once more");

    let blue_spawns = shared::world::BLUE_SPAWNS;
    let expected = blue_spawns[1usize % blue_spawns.len()];
    assert_eq!((sched.sim.players[&1].x, sched.sim.players[&1].y), expected);
}

/// 4. Lag-compensated kick: the kicker and ball have since drifted apart at
/// the server's current tick, but their positions 120 ms ago — what the
/// client actually saw — were close enough to validate.
#[test]
fn lag_compensated_kick_validates_against_rewound_history() {
    let mut sched = scheduler();
    sched.sim.add_player(1, PlayerStats::balanced());
    sched.sim.assign_team(1, Team::Red);
    sched.sim.tick = 1000;
    let now_ms = sched.sim.elapsed_ms();
    let rewound_ms = now_ms - 120;

    sched.sim.players.get_mut(&1).unwrap().x = 2000.0;
    sched.sim.players.get_mut(&1).unwrap().y = 800.0;
    sched.sim.ball.x = 900.0;
    sched.sim.ball.y = 800.0;

    sched.sim.player_history.get_mut(&1).unwrap().push(940.0, 800.0, rewound_ms);
    sched.sim.ball_history.push(980.0, 800.0, rewound_ms);

    // Validated against the current positions this kick would be rejected
    // (distance 1100 px, far beyond the 250 px base tolerance).
    let current_distance = ((sched.sim.players[&1].x - sched.sim.ball.x).powi(2) + (sched.sim.players[&1].y - sched.sim.ball.y).powi(2)).sqrt();
    assert!(current_distance > shared::skills::BASE_KICK_DISTANCE);

    let accepted = server::input::try_kick(&mut sched.sim, 1, 0.0, 1000.0, Some(rewound_ms));
    assert!(accepted, "the rewound 40 px distance should validate even though the live distance would not");
}

/// 5. Blink: a facing-right player teleports the full 400 px along their
/// facing vector, stops dead, and the dedicated blink event carries the
/// from/to coordinates; the skill's cooldown blocks immediate reuse.
#[test]
fn blink_teleports_along_facing_vector_and_then_cools_down() {
    let mut sched = scheduler();
    sched.sim.add_player(1, PlayerStats::balanced());
    sched.sim.assign_team(1, Team::Red);
    sched.sim.players.get_mut(&1).unwrap().x = 1000.0;
    sched.sim.players.get_mut(&1).unwrap().y = 800.0;
    sched.sim.players.get_mut(&1).unwrap().vx = 50.0;
    let mut outbound = sched.room.register_client(1);

    sched.handle_message(1, ClientMessage::SoccerActivateSkill { skill_id: SkillId::Blink, facing_direction: Some(0.0) });

    let player = sched.sim.players[&1];
    assert!((player.x - 1400.0).abs() < 1e-6);
    assert_eq!(player.y, 800.0);
    assert_eq!(player.vx, 0.0);
    assert_eq!(player.vy, 0.0);

    let blink_event = std::iter::from_fn(|| outbound.try_recv().ok()).find_map(|m| match m {
        ServerMessage::SoccerBlinkActivated { from_x, from_y, to_x, to_y, .. } => Some((from_x, from_y, to_x, to_y)),
        _ => None,
    });
    assert_eq!(blink_event, Some((1000.0, 800.0, 1400.0, 800.0)));

    // Still within the 12 s cooldown: rejected, no further movement.
    sched.sim.tick += 749;
    sched.handle_message(1, ClientMessage::SoccerActivateSkill { skill_id: SkillId::Blink, facing_direction: Some(0.0) });
    assert_eq!(sched.sim.players[&1].x, 1400.0, "blink must stay on cooldown for 12 s");

    // Past the cooldown: usable again.
    sched.sim.tick += 1;
    sched.handle_message(1, ClientMessage::SoccerActivateSkill { skill_id: SkillId::Blink, facing_direction: Some(0.0) });
    assert!((sched.sim.players[&1].x - 1800.0).abs() < 1e-6);
}

/// 6. Selection snake + auto-pick: with the current picker silent past
/// their turn deadline, the server auto-picks on their behalf, announces
/// the next picker, and starts the match the instant every picker has
/// chosen.
#[test]
fn selection_auto_picks_on_timeout_and_starts_the_match() {
    let mut sched = scheduler();
    for id in 1..=4u32 {
        sched.sim.add_player(id, PlayerStats::balanced());
        let team = if id % 2 == 1 { Team::Red } else { Team::Blue };
        sched.sim.assign_team(id, team);
    }
    let mut outbound = sched.room.register_client(1);
    orchestrator::start_selection(&mut sched.sim);

    for _ in 0..4 {
        // Force the current picker's 30 s turn deadline to have already
        // elapsed, then let one physics step notice and auto-pick.
        sched.sim.match_state.selection.turn_deadline_ms = 0;
        sched.step_once();

        let messages: Vec<ServerMessage> = std::iter::from_fn(|| outbound.try_recv().ok()).collect();
        assert!(messages.iter().any(|m| matches!(m, ServerMessage::SoccerSkillPicked { .. })), "expected an auto-pick broadcast");
        let still_selecting = sched.sim.match_state.status == shared::match_state::MatchStatus::SkillSelection;
        assert_eq!(
            still_selecting,
            messages.iter().any(|m| matches!(m, ServerMessage::SoccerSelectionUpdate { .. })),
            "the next picker should be announced exactly while selection is still open"
        );
    }

    assert_eq!(sched.sim.match_state.status, shared::match_state::MatchStatus::Active);
    assert_eq!(sched.sim.match_state.assigned_skill.len(), 4);
}
