//! The immutable pitch description: collision rectangles, goal zones, and
//! team spawn points. Loaded once at startup from two JSON files and never
//! mutated afterward, so it can be shared across tasks without
//! synchronization (see `server::simulation`).

use serde::{Deserialize, Serialize};

use crate::entities::Team;

/// One axis-aligned collision rectangle (pitch wall or obstacle).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CollisionRect {
    pub fn left(&self) -> f64 {
        self.x
    }
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
    pub fn top(&self) -> f64 {
        self.y
    }
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Closest point on (or in) the rectangle to `(px, py)`.
    pub fn closest_point(&self, px: f64, py: f64) -> (f64, f64) {
        (px.clamp(self.left(), self.right()), py.clamp(self.top(), self.bottom()))
    }
}

/// One goal zone. A ball center inside this rect scores for `team`'s
/// opponent (the zone belongs to the team defending it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalZone {
    pub name: String,
    pub team: Team,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GoalZone {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

#[derive(Debug, Deserialize)]
struct CollisionFile {
    collisions: Vec<CollisionRect>,
}

#[derive(Debug, Deserialize)]
struct GoalFile {
    goals: Vec<RawGoal>,
}

#[derive(Debug, Deserialize)]
struct RawGoal {
    name: String,
    team: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Fixed team spawn points, six per side, indexed by a player's position in
/// their team's join order. Generalizes the teacher's per-client spawn
/// formula (`server::game::add_player`) into an explicit table, since the
/// spec requires specific per-team slots rather than a derived offset.
pub const RED_SPAWNS: [(f64, f64); 6] =
    [(600.0, 800.0), (900.0, 500.0), (900.0, 1100.0), (1300.0, 800.0), (1300.0, 400.0), (1300.0, 1200.0)];

pub const BLUE_SPAWNS: [(f64, f64); 6] = [
    (2920.0, 800.0),
    (2620.0, 500.0),
    (2620.0, 1100.0),
    (2220.0, 800.0),
    (2220.0, 400.0),
    (2220.0, 1200.0),
];

/// x-coordinate of the opponent goal line, used by the power-shot auto-aim
/// (§4.H): red shoots toward x=3400, blue toward x=120.
pub fn opponent_goal_x(team: Team) -> f64 {
    match team {
        Team::Red => 3400.0,
        Team::Blue => 120.0,
        Team::Spectator | Team::None => crate::kernel::PITCH_WIDTH / 2.0,
    }
}

pub const POWER_SHOT_GOAL_Y: f64 = 800.0;

/// The immutable, process-wide pitch description.
#[derive(Debug, Clone)]
pub struct StaticWorld {
    pub collisions: Vec<CollisionRect>,
    pub goals: Vec<GoalZone>,
}

impl StaticWorld {
    /// Loads collision rects and goal zones from two JSON files, in the
    /// exact shapes named in the operational interfaces:
    /// `{"collisions": [{"x","y","width","height"}, ...]}` and
    /// `{"goals": [{"name","team","x","y","width","height"}, ...]}`.
    pub fn load_from_files(
        collisions_path: &std::path::Path,
        goals_path: &std::path::Path,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let collisions_raw = std::fs::read_to_string(collisions_path)?;
        let goals_raw = std::fs::read_to_string(goals_path)?;
        Self::parse(&collisions_raw, &goals_raw)
    }

    pub fn parse(collisions_json: &str, goals_json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let collision_file: CollisionFile = serde_json::from_str(collisions_json)?;
        let goal_file: GoalFile = serde_json::from_str(goals_json)?;

        let goals = goal_file
            .goals
            .into_iter()
            .map(|g| {
                let team = match g.team.as_str() {
                    "red" => Team::Red,
                    "blue" => Team::Blue,
                    other => return Err(format!("unknown goal team {other:?}").into()),
                };
                Ok(GoalZone { name: g.name, team, x: g.x, y: g.y, width: g.width, height: g.height })
            })
            .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

        Ok(Self { collisions: collision_file.collisions, goals })
    }

    /// The default pitch: a perimeter wall at the pitch bounds plus one goal
    /// zone per side, used by tests and as a fallback when no data files are
    /// configured.
    pub fn default_pitch() -> Self {
        let goals = vec![
            GoalZone {
                name: "red_goal".into(),
                team: Team::Red,
                x: 0.0,
                y: 700.0,
                width: 40.0,
                height: 200.0,
            },
            GoalZone {
                name: "blue_goal".into(),
                team: Team::Blue,
                x: crate::kernel::PITCH_WIDTH - 40.0,
                y: 700.0,
                width: 40.0,
                height: 200.0,
            },
        ];
        Self { collisions: Vec::new(), goals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_json_shapes() {
        let collisions = r#"{"collisions": [{"x": 0.0, "y": 0.0, "width": 100.0, "height": 10.0}]}"#;
        let goals = r#"{"goals": [{"name": "red_goal", "team": "red", "x": 0.0, "y": 700.0, "width": 40.0, "height": 200.0}]}"#;
        let world = StaticWorld::parse(collisions, goals).unwrap();
        assert_eq!(world.collisions.len(), 1);
        assert_eq!(world.goals.len(), 1);
        assert_eq!(world.goals[0].team, Team::Red);
    }

    #[test]
    fn rejects_unknown_goal_team() {
        let collisions = r#"{"collisions": []}"#;
        let goals = r#"{"goals": [{"name": "x", "team": "green", "x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0}]}"#;
        assert!(StaticWorld::parse(collisions, goals).is_err());
    }

    #[test]
    fn goal_zone_contains_checks_bounds() {
        let zone = GoalZone { name: "g".into(), team: Team::Red, x: 10.0, y: 10.0, width: 20.0, height: 20.0 };
        assert!(zone.contains(15.0, 15.0));
        assert!(!zone.contains(40.0, 40.0));
    }
}
