//! The stats repository interface. Player MMR/stat persistence is an
//! external collaborator the design only specifies through its read/write
//! contract (§6); no teacher precedent exists since the teacher persists
//! nothing, so this follows the trait-plus-in-memory-mock idiom used
//! across the pack for the same reason (an interface named but not owned
//! by the simulation).

use std::collections::HashMap;
use std::sync::Mutex;

use shared::entities::PlayerStats;

/// A player's persisted profile: chosen stat triple and matchmaking
/// rating, both of which outlive any single match.
#[derive(Debug, Clone, Copy)]
pub struct PlayerProfile {
    pub stats: PlayerStats,
    pub mmr: i32,
    pub win_streak: u32,
}

impl PlayerProfile {
    pub fn new(stats: PlayerStats) -> Self {
        Self { stats, mmr: 1000, win_streak: 0 }
    }
}

/// Read/write access to persisted player profiles. A missing row on join
/// is not an error — `load` returning `None` signals the caller to emit
/// `StatsUnavailable` and prompt the client for a stat assignment (§7).
pub trait StatsRepository: Send + Sync {
    fn load(&self, player_id: u32) -> Option<PlayerProfile>;
    fn save(&self, player_id: u32, profile: PlayerProfile);
}

/// In-memory mock used by tests and the bundled demo; a real deployment
/// would back this with whatever database the surrounding service uses.
#[derive(Default)]
pub struct InMemoryStatsRepository {
    profiles: Mutex<HashMap<u32, PlayerProfile>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, player_id: u32, profile: PlayerProfile) {
        self.profiles.lock().unwrap().insert(player_id, profile);
    }
}

impl StatsRepository for InMemoryStatsRepository {
    fn load(&self, player_id: u32) -> Option<PlayerProfile> {
        self.profiles.lock().unwrap().get(&player_id).copied()
    }

    fn save(&self, player_id: u32, profile: PlayerProfile) {
        self.profiles.lock().unwrap().insert(player_id, profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_profile_loads_as_none() {
        let repo = InMemoryStatsRepository::new();
        assert!(repo.load(1).is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let repo = InMemoryStatsRepository::new();
        repo.save(1, PlayerProfile::new(PlayerStats::balanced()));
        let loaded = repo.load(1).unwrap();
        assert_eq!(loaded.mmr, 1000);
        assert_eq!(loaded.stats, PlayerStats::balanced());
    }
}
