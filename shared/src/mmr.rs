//! MMR delta arithmetic, invoked only on game end (§6). The real MMR store
//! is an external collaborator (`server::persistence::StatsRepository`);
//! this module only computes the delta to apply.

use serde::{Deserialize, Serialize};

use crate::match_state::PlayerMatchStats;

pub const BASE_DELTA: i32 = 25;
pub const MVP_BONUS: i32 = 5;
pub const FEAT_BONUS_EACH: i32 = 2;

/// Named contribution terms, kept separate purely for client display —
/// mirrors the wire convention elsewhere in this crate of self-describing
/// fields over bare numbers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MmrBreakdown {
    pub base: i32,
    pub streak_bonus: i32,
    pub mvp_bonus: i32,
    pub feat_bonus: i32,
}

impl MmrBreakdown {
    pub fn total(&self) -> i32 {
        self.base + self.streak_bonus + self.mvp_bonus + self.feat_bonus
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MmrUpdate {
    pub player_id: u32,
    pub delta: i32,
    pub new_mmr: i32,
    pub breakdown: MmrBreakdown,
}

/// Streak bonus: +5 at a 3-game win streak, +10 at 5 (not cumulative —
/// the higher threshold replaces the lower one).
fn streak_bonus(win_streak: u32) -> i32 {
    if win_streak >= 5 {
        10
    } else if win_streak >= 3 {
        5
    } else {
        0
    }
}

/// Computes one player's MMR update for a completed game.
///
/// `won` gates the base delta and streak bonus (losers get neither); MVP
/// and feat bonuses apply regardless of win/loss since they measure
/// individual performance.
pub fn compute_mmr_delta(current_mmr: i32, stats: &PlayerMatchStats, won: bool, win_streak: u32, is_mvp: bool) -> MmrUpdate {
    let breakdown = MmrBreakdown {
        base: if won { BASE_DELTA } else { -BASE_DELTA },
        streak_bonus: if won { streak_bonus(win_streak) } else { 0 },
        mvp_bonus: if is_mvp { MVP_BONUS } else { 0 },
        feat_bonus: stats.feat_count() as i32 * FEAT_BONUS_EACH,
    };
    let delta = breakdown.total();
    MmrUpdate { player_id: 0, delta, new_mmr: current_mmr + delta, breakdown }
}
