//! Snapshot assembly. Generalizes the teacher's
//! `Server::broadcast_game_state` (early-return on no clients, one packet
//! built once and fanned out) from a single `Packet::GameState` to the
//! split ball/player snapshot pair plus edge-triggered events this design
//! calls for.

use shared::protocol::{BallSnapshot, ClientMessage, PlayerSnapshot, ServerMessage};
use shared::Team;

use crate::room::Room;
use crate::simulation::SimulationState;

/// Builds the per-tick player snapshot list and last-processed-sequence
/// map, then broadcasts both the ball and player updates. Early-returns if
/// there are no players at all, matching the teacher's no-clients guard.
pub fn broadcast_physics(sim: &SimulationState, room: &dyn Room, last_processed: &std::collections::HashMap<u32, u64>) {
    if sim.players.is_empty() {
        return;
    }

    let now = sim.elapsed_ms();
    let players: Vec<PlayerSnapshot> = sim
        .players
        .values()
        .map(|p| PlayerSnapshot {
            id: p.id,
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            is_ghosted: sim.skills.get(&p.id).is_some_and(|s| s.ninja_step_on),
            is_spectator: p.is_spectator(),
            last_processed_sequence: last_processed.get(&p.id).copied().unwrap_or(0),
            timestamp: now,
        })
        .collect();

    room.broadcast(
        ServerMessage::PlayersPhysicsUpdate { players, last_processed_sequence: last_processed.clone() },
        None,
    );

    let ball = BallSnapshot {
        x: sim.ball.x,
        y: sim.ball.y,
        vx: sim.ball.vx,
        vy: sim.ball.vy,
        last_touch_id: sim.ball.last_touch_id,
        kick_sequence: sim.ball.kick_sequence,
        server_tick: sim.tick,
        timestamp: now,
    };
    room.broadcast(ServerMessage::BallState(ball), None);
}

/// Emits the one-shot, edge-triggered events a physics step can produce:
/// a goal (and, if applicable, its reset), an interception, a kick. These
/// never replay on the following network tick — the caller detects the
/// edge (e.g. `pending_goal_reset_tick` going from `None` to `Some`) and
/// calls the matching `emit_*` function exactly once.
pub fn emit_goal(room: &dyn Room, scoring_team: Team, scorer_id: Option<u32>, assist_id: Option<u32>) {
    room.broadcast(ServerMessage::GoalScored { scoring_team, scorer_id, assist_id }, None);
}

pub fn emit_interception(room: &dyn Room, player_id: u32, previous_team: Team) {
    room.broadcast(ServerMessage::BallIntercepted { player_id, previous_team }, None);
}

pub fn emit_kick(room: &dyn Room, kicker_id: u32, kick_sequence: u64, local_kick_id: Option<u32>) {
    room.broadcast(ServerMessage::BallKicked { kicker_id, kick_sequence, local_kick_id }, None);
}

/// Routes a single-requester query (`SoccerRequestGameState`/
/// `SoccerRequestSkillConfig`/`SoccerGetPlayers`) to a direct reply rather
/// than a room-wide broadcast, per §6's "existing broadcast variants,
/// addressed to the requester" note.
pub fn reply_to_request(sim: &SimulationState, room: &dyn Room, requester_id: u32, request: &ClientMessage) {
    match request {
        ClientMessage::SoccerRequestGameState | ClientMessage::SoccerGetPlayers => {
            let players: Vec<PlayerSnapshot> = sim
                .players
                .values()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                    vx: p.vx,
                    vy: p.vy,
                    is_ghosted: sim.skills.get(&p.id).is_some_and(|s| s.ninja_step_on),
                    is_spectator: p.is_spectator(),
                    last_processed_sequence: 0,
                    timestamp: sim.elapsed_ms(),
                })
                .collect();
            room.send_to(
                requester_id,
                ServerMessage::PlayersPhysicsUpdate { players, last_processed_sequence: std::collections::HashMap::new() },
            );
        }
        ClientMessage::SoccerRequestSkillConfig => {
            room.send_to(requester_id, ServerMessage::SoccerSelectionPhaseStarted { order: sim.match_state.selection.order.clone() });
        }
        _ => {
            room.send_to(requester_id, ServerMessage::Rejected { reason: "not a request message".into() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::ChannelRoom;
    use shared::entities::PlayerStats;

    #[test]
    fn no_players_suppresses_broadcast() {
        let sim = SimulationState::new();
        let mut room = ChannelRoom::new();
        let mut rx = room.register_client(1);
        broadcast_physics(&sim, &room, &std::collections::HashMap::new());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn physics_broadcast_sends_both_snapshots() {
        let mut sim = SimulationState::new();
        sim.add_player(1, PlayerStats::balanced());
        let mut room = ChannelRoom::new();
        let mut rx = room.register_client(1);
        broadcast_physics(&sim, &room, &std::collections::HashMap::new());
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::PlayersPhysicsUpdate { .. }));
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::BallState(_)));
    }
}
