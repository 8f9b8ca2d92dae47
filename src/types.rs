use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::Stop,
    ];
    pub const MOVES: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "stop" | "none" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Stop => "stop",
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Stop => (0, 0),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Stop => Self::Stop,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn to_position(self) -> Position {
        Position {
            x: self.x as f32,
            y: self.y as f32,
        }
    }
}

/// Continuous agent coordinate. Scared ghosts move in half steps, so values
/// are always multiples of 0.5 and compare exactly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn nearest_cell(self) -> Vec2 {
        Vec2 {
            x: (self.x + 0.5).floor() as i32,
            y: (self.y + 0.5).floor() as i32,
        }
    }

    pub fn manhattan(self, other: Position) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(self, dir: Direction, speed: f32) -> Position {
        let (dx, dy) = dir.delta();
        Position {
            x: self.x + dx as f32 * speed,
            y: self.y + dy as f32 * speed,
        }
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub pos: Position,
    pub dir: Direction,
}

impl Configuration {
    pub fn at(cell: Vec2) -> Self {
        Self {
            pos: cell.to_position(),
            dir: Direction::Stop,
        }
    }

    pub fn advanced(self, action: Direction, speed: f32) -> Self {
        Self {
            pos: self.pos.offset(action, speed),
            dir: if action == Direction::Stop {
                self.dir
            } else {
                action
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AgentState {
    pub start: Configuration,
    pub config: Configuration,
    pub is_pacman: bool,
    #[serde(rename = "scaredTimer")]
    pub scared_timer: u32,
    #[serde(rename = "respawnTimer")]
    pub respawn_timer: u32,
}

impl AgentState {
    pub fn new(start: Configuration, is_pacman: bool) -> Self {
        Self {
            start,
            config: start,
            is_pacman,
            scared_timer: 0,
            respawn_timer: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.config.pos
    }

    pub fn direction(&self) -> Direction {
        self.config.dir
    }

    pub fn is_scared(&self) -> bool {
        self.scared_timer > 0
    }

    pub fn is_active(&self) -> bool {
        self.respawn_timer == 0
    }

    pub fn reset_to_start(&mut self) {
        self.config = self.start;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleEvent {
    FoodEaten {
        x: i32,
        y: i32,
    },
    CapsuleEaten {
        x: i32,
        y: i32,
        #[serde(rename = "scaredTime")]
        scared_time: u32,
    },
    Teleported {
        from: Vec2,
        to: Vec2,
    },
    GhostEaten {
        ghost: usize,
        points: i64,
        streak: u32,
    },
    PacmanCaught {
        ghost: usize,
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    GameLost,
    RoundComplete,
    RoundStarted {
        round: u32,
        lives: i32,
    },
    GameWon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Lost,
    Won,
    MoveLimit,
}

impl GameOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Won => "won",
            Self::MoveLimit => "move_limit",
        }
    }
}
