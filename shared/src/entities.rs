//! Core data model: ball, player physics, player stats, input samples.

use serde::{Deserialize, Serialize};

/// Team/role assignment for a player on the pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
    Spectator,
    /// Not yet assigned (lobby, pre-team-pick).
    None,
}

/// Authoritative ball state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub moving: bool,
    pub last_touch_id: Option<u32>,
    pub previous_touch_id: Option<u32>,
    pub last_touch_timestamp: u64,
    /// Monotonically increased on every authoritative kick/dribble/reset/
    /// teleport that replaces ball velocity.
    pub kick_sequence: u64,
}

impl BallState {
    pub fn at_center() -> Self {
        Self {
            x: crate::kernel::PITCH_WIDTH / 2.0,
            y: crate::kernel::PITCH_HEIGHT / 2.0,
            vx: 0.0,
            vy: 0.0,
            moving: false,
            last_touch_id: None,
            previous_touch_id: None,
            last_touch_timestamp: 0,
            kick_sequence: 0,
        }
    }

    pub fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// Per-player stat triple. Always sums to 15; enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub speed: u8,
    pub kick_power: u8,
    pub dribbling: u8,
}

impl PlayerStats {
    /// Returns `None` if `speed + kick_power + dribbling != 15`.
    pub fn checked_new(speed: u8, kick_power: u8, dribbling: u8) -> Option<Self> {
        if speed as u16 + kick_power as u16 + dribbling as u16 == 15 {
            Some(Self { speed, kick_power, dribbling })
        } else {
            None
        }
    }

    pub fn balanced() -> Self {
        Self { speed: 5, kick_power: 5, dribbling: 5 }
    }
}

/// Authoritative per-player physics record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerPhysics {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub team: Team,
    pub stats: PlayerStats,
}

impl PlayerPhysics {
    pub fn new(id: u32, x: f64, y: f64, team: Team, stats: PlayerStats) -> Self {
        Self { id, x, y, vx: 0.0, vy: 0.0, team, stats }
    }

    pub fn is_spectator(&self) -> bool {
        matches!(self.team, Team::Spectator | Team::None)
    }
}

/// One frame of directional input, sequence-numbered per player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub sequence: u64,
}
