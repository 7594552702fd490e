//! Match/lobby state machine data and the scoring formulas that turn raw
//! per-player events into MVP/feat counts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::Team;
use crate::skills::SkillId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Lobby,
    SkillSelection,
    Active,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Score {
    pub red: u32,
    pub blue: u32,
}

/// Per-player accumulated stats for the current match, used for MVP/feat
/// scoring at game end.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerMatchStats {
    pub goals: u32,
    pub assists: u32,
    pub interceptions: u32,
}

impl PlayerMatchStats {
    /// `goals*10 + assists*5 + interceptions*2`.
    pub fn mvp_score(&self) -> u32 {
        self.goals * 10 + self.assists * 5 + self.interceptions * 2
    }

    /// +1 per threshold crossed (goals>=2, assists>=2, interceptions>=3),
    /// capped at 3.
    pub fn feat_count(&self) -> u32 {
        let mut feats = 0;
        if self.goals >= 2 {
            feats += 1;
        }
        if self.assists >= 2 {
            feats += 1;
        }
        if self.interceptions >= 3 {
            feats += 1;
        }
        feats.min(3)
    }
}

/// Snake-order skill selection bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionState {
    pub order: Vec<u32>,
    pub current_index: usize,
    pub available: Vec<SkillId>,
    pub turn_deadline_ms: u64,
}

impl SelectionState {
    pub fn current_picker(&self) -> Option<u32> {
        self.order.get(self.current_index).copied()
    }

    pub fn advance(&mut self) {
        self.current_index += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.order.len()
    }
}

pub const GAME_DURATION_SECS: u32 = 300;
pub const OVERTIME_SECS: u32 = 60;
pub const SELECTION_TURN_SECS: u32 = 30;

/// Full match state: status, score, clock, selection bookkeeping, and
/// per-player match stats / assigned skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub status: MatchStatus,
    pub score: Score,
    pub clock_secs_remaining: u32,
    pub in_overtime: bool,
    pub selection: SelectionState,
    pub stats: HashMap<u32, PlayerMatchStats>,
    pub assigned_skill: HashMap<u32, SkillId>,
    pub teams: HashMap<u32, Team>,
}

impl MatchState {
    pub fn new_lobby() -> Self {
        Self {
            status: MatchStatus::Lobby,
            score: Score::default(),
            clock_secs_remaining: GAME_DURATION_SECS,
            in_overtime: false,
            selection: SelectionState::default(),
            stats: HashMap::new(),
            assigned_skill: HashMap::new(),
            teams: HashMap::new(),
        }
    }

    pub fn stats_for(&mut self, player_id: u32) -> &mut PlayerMatchStats {
        self.stats.entry(player_id).or_default()
    }

    /// The player with the highest MVP score; ties broken by lowest id for
    /// determinism.
    pub fn mvp(&self) -> Option<(u32, u32)> {
        self.stats
            .iter()
            .map(|(&id, s)| (id, s.mvp_score()))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }
}
