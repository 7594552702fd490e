//! Skill identifiers and the tagged-variant effect dispatch that replaces
//! runtime type-checks on skill kind (redesign direction: one `match`
//! handler over a closed enum instead of per-skill branching scattered
//! through the update loop).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillId {
    Slowdown,
    Blink,
    Metavision,
    NinjaStep,
    LurkingRadius,
    PowerShot,
}

impl SkillId {
    pub const ALL: [SkillId; 6] =
        [SkillId::Slowdown, SkillId::Blink, SkillId::Metavision, SkillId::NinjaStep, SkillId::LurkingRadius, SkillId::PowerShot];

    /// Cooldown before this skill can be used again, milliseconds.
    pub fn cooldown_ms(self) -> u64 {
        match self {
            SkillId::Slowdown => 30_000,
            SkillId::Blink => 12_000,
            SkillId::Metavision => 20_000,
            SkillId::NinjaStep => 0,
            SkillId::LurkingRadius => 20_000,
            SkillId::PowerShot => 20_000,
        }
    }

    /// Active-effect duration, milliseconds. Zero for instantaneous/toggle
    /// skills (blink, ninja_step).
    pub fn duration_ms(self) -> u64 {
        match self {
            SkillId::Slowdown => 5_000,
            SkillId::Blink => 0,
            SkillId::Metavision => 8_000,
            SkillId::NinjaStep => 0,
            SkillId::LurkingRadius => 5_000,
            SkillId::PowerShot => 3_000,
        }
    }
}

/// A concrete, mutated-state effect produced by activating a skill. Carries
/// the numeric parameters so `server::skills` never has to branch on
/// `SkillId` again once an effect is constructed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Multiplies every other active player's speed multiplier by `mul`
    /// for the duration of the effect.
    SpeedSlow { mul: f64 },
    /// Teleport `dist` pixels along the facing vector. `prevent_clip` is
    /// true only for spectators — on-pitch players always blink.
    Blink { dist: f64, prevent_clip: bool },
    /// Own kick distance tolerance extended, kick power boosted.
    Metavision,
    /// Toggle: while not near the ball, phase through other players.
    NinjaStep,
    /// Arm a radius zone; a second activation within the window teleports
    /// the player to the ball if it's inside `radius`.
    Lurking { radius: f64, duration_ms: u64 },
    /// Auto-aimed shot toward the opponent goal with amplified knockback
    /// and ball retention for the window.
    PowerShot { force: f64, knockback: f64, retention: f64, window_ms: u64 },
}

impl SkillEffect {
    pub fn for_skill(id: SkillId) -> Self {
        match id {
            SkillId::Slowdown => SkillEffect::SpeedSlow { mul: 0.35 },
            SkillId::Blink => SkillEffect::Blink { dist: BLINK_MAX_DIST, prevent_clip: true },
            SkillId::Metavision => SkillEffect::Metavision,
            SkillId::NinjaStep => SkillEffect::NinjaStep,
            SkillId::LurkingRadius => SkillEffect::Lurking { radius: 500.0, duration_ms: SkillId::LurkingRadius.duration_ms() },
            SkillId::PowerShot => SkillEffect::PowerShot { force: 2000.0, knockback: 300.0, retention: 0.8, window_ms: 3_000 },
        }
    }
}

/// Blink teleport distance range, pixels; the concrete distance used is the
/// maximum of the range, set in `SkillEffect::for_skill`.
pub const BLINK_MIN_DIST: f64 = 300.0;
pub const BLINK_MAX_DIST: f64 = 400.0;

/// Metavision's extended kick tolerance and kick-power multiplier.
pub const METAVISION_KICK_DISTANCE: f64 = 300.0;
pub const BASE_KICK_DISTANCE: f64 = 250.0;

/// Lurking teleport offset from the ball, pixels.
pub const LURKING_TELEPORT_OFFSET: f64 = 40.0;
