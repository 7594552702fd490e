//! Wire protocol between a client and the authoritative server. Mirrors the
//! teacher's `Packet` convention of one flat enum per direction with fully
//! named fields, serialized with `bincode` over whatever `server::room::Room`
//! implementation carries the bytes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{InputState, Team};
use crate::mmr::MmrUpdate;
use crate::skills::SkillId;

/// A player's snapshot fields as broadcast at network cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub is_ghosted: bool,
    pub is_spectator: bool,
    pub last_processed_sequence: u64,
    pub timestamp: u64,
}

/// The ball's snapshot fields as broadcast at network cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub last_touch_id: Option<u32>,
    pub kick_sequence: u64,
    pub server_tick: u64,
    pub timestamp: u64,
}

/// Messages sent from a client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Registers the player, loading persisted stats read-through the
    /// stats repository, and places them in a team or spectator spawn
    /// depending on match status.
    PlayerJoin { x: f64, y: f64, scene: String },
    /// Ordered input batch; never downsampled to the latest sample only.
    PlayerInputBatch { inputs: Vec<InputState> },
    BallKick { player_id: u32, angle: f64, kick_power: f64, timestamp: Option<u64>, sequence: Option<u64>, local_kick_id: Option<u32> },
    BallDribble { player_id: u32, player_x: f64, player_y: f64, player_vx: f64, player_vy: f64, timestamp: Option<u64> },
    SoccerAssignTeam { team: Team },
    SoccerResetGame,
    SoccerStartGame,
    SoccerRandomizeTeams,
    SoccerPickSkill { skill_id: SkillId },
    SoccerActivateSkill { skill_id: SkillId, facing_direction: Option<f64> },
    SoccerRequestGameState,
    SoccerRequestSkillConfig,
    SoccerGetPlayers,
    PlayerSceneChange { new_scene: String, x: f64, y: f64 },
}

/// Messages sent from the server, either to one client or to a whole room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    BallState(BallSnapshot),
    PlayersPhysicsUpdate { players: Vec<PlayerSnapshot>, last_processed_sequence: HashMap<u32, u64> },
    BallKicked { kicker_id: u32, kick_sequence: u64, local_kick_id: Option<u32> },
    BallIntercepted { player_id: u32, previous_team: Team },
    GoalScored { scoring_team: Team, scorer_id: Option<u32>, assist_id: Option<u32> },
    SoccerPlayerReset { player_id: u32, x: f64, y: f64 },
    SoccerTeamAssigned { player_id: u32, team: Team, spawn_x: f64, spawn_y: f64 },
    SoccerGameReset,
    SoccerSelectionPhaseStarted { order: Vec<u32> },
    SoccerSelectionUpdate { current_picker: u32, available: Vec<SkillId>, deadline_ms: u64 },
    SoccerSkillPicked { player_id: u32, skill_id: SkillId },
    SoccerStartMidGamePick { player_id: u32 },
    SoccerSkillActivated { player_id: u32, skill_id: SkillId },
    SoccerSkillEnded { player_id: u32, skill_id: SkillId },
    SoccerSkillTriggered { player_id: u32, skill_id: SkillId },
    SoccerBlinkActivated { player_id: u32, from_x: f64, from_y: f64, to_x: f64, to_y: f64 },
    SoccerGameStarted,
    SoccerOvertime,
    SoccerTimerUpdate { seconds_remaining: u32 },
    SoccerGameEnd { winner: Team, score_red: u32, score_blue: u32, mvp_player_id: Option<u32>, mmr_updates: Vec<MmrUpdate> },
    /// Signals a missing stats row on join: client should prompt stat
    /// assignment rather than treating this as an error (§7).
    StatsUnavailable { player_id: u32 },
    /// Reply to `SoccerRequestGameState`/`SoccerRequestSkillConfig`/
    /// `SoccerGetPlayers` is carried by the existing broadcast variants
    /// above, addressed to the single requester rather than the room.
    Rejected { reason: String },
}
