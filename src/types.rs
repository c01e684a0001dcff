use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    // y grows downwards
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn neighbor(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotBehavior {
    Patrol,
    Chase,
    Ambush,
}

impl RobotBehavior {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "patrol" => Some(Self::Patrol),
            "chase" => Some(Self::Chase),
            "ambush" => Some(Self::Ambush),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    MazeCleared,
    Caught,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub tile: Vec2,
    #[serde(rename = "targetTile")]
    pub target_tile: Vec2,
    pub progress: f32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Option<Direction>,
    pub x: f32,
    pub y: f32,
    pub lives: u32,
    pub score: u32,
    #[serde(rename = "poweredUp")]
    pub powered_up: bool,
    #[serde(rename = "powerupTimer")]
    pub powerup_timer: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct RobotView {
    pub id: u32,
    pub tile: Vec2,
    #[serde(rename = "targetTile")]
    pub target_tile: Vec2,
    pub progress: f32,
    pub dir: Direction,
    pub x: f32,
    pub y: f32,
    pub behavior: RobotBehavior,
    #[serde(rename = "isProtected")]
    pub is_protected: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    PowerExpired,
    RobotDefeated {
        #[serde(rename = "robotId")]
        robot_id: u32,
    },
    PlayerCaught {
        #[serde(rename = "robotId")]
        robot_id: u32,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    GameOver {
        reason: GameOverReason,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub frame: u64,
    #[serde(rename = "elapsedSec")]
    pub elapsed_sec: f32,
    #[serde(rename = "collectiblesLeft")]
    pub collectibles_left: usize,
    pub player: PlayerView,
    pub robots: Vec<RobotView>,
    pub events: Vec<SessionEvent>,
    #[serde(rename = "gameOver")]
    pub game_over: Option<GameOverReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ALL {
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn neighbor_follows_screen_axes() {
        let origin = Vec2::new(4, 3);
        assert_eq!(origin.neighbor(Direction::Up), Vec2::new(4, 2));
        assert_eq!(origin.neighbor(Direction::Down), Vec2::new(4, 4));
        assert_eq!(origin.neighbor(Direction::Left), Vec2::new(3, 3));
        assert_eq!(origin.neighbor(Direction::Right), Vec2::new(5, 3));
    }

    #[test]
    fn behavior_parsing_is_case_insensitive() {
        assert_eq!(RobotBehavior::parse(" Chase "), Some(RobotBehavior::Chase));
        assert_eq!(RobotBehavior::parse("ambush"), Some(RobotBehavior::Ambush));
        assert_eq!(RobotBehavior::parse("scatter"), None);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let text = serde_json::to_string(&SessionEvent::PlayerCaught {
            robot_id: 2,
            lives_left: 1,
        })
        .expect("event should serialize");
        assert_eq!(text, r#"{"type":"player_caught","robotId":2,"livesLeft":1}"#);
    }
}
