use serde::Serialize;

use crate::state::GameState;
use crate::types::{Direction, Position, RuleEvent, Vec2};

pub trait Display {
    fn initialize(&mut self, _state: &GameState) {}

    fn update(&mut self, state: &GameState);

    fn finish(&mut self) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn update(&mut self, _state: &GameState) {}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentView {
    pub index: usize,
    pub pos: Position,
    pub dir: Direction,
    #[serde(rename = "scaredTimer")]
    pub scared_timer: u32,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateDiff {
    pub turn: u64,
    #[serde(rename = "agentMoved")]
    pub agent_moved: Option<usize>,
    #[serde(rename = "foodEaten")]
    pub food_eaten: Option<Vec2>,
    #[serde(rename = "capsuleEaten")]
    pub capsule_eaten: Option<Vec2>,
    pub score: i64,
    #[serde(rename = "scoreChange")]
    pub score_change: i64,
    pub lives: i32,
    pub agents: Vec<AgentView>,
    pub events: Vec<RuleEvent>,
}

impl StateDiff {
    pub fn from_state(turn: u64, state: &GameState) -> Self {
        let agents = state
            .agent_states()
            .iter()
            .enumerate()
            .map(|(index, agent)| AgentView {
                index,
                pos: agent.position(),
                dir: agent.direction(),
                scared_timer: agent.scared_timer,
                visible: agent.is_active(),
            })
            .collect();
        Self {
            turn,
            agent_moved: state.last_agent_moved(),
            food_eaten: state.last_food_eaten(),
            capsule_eaten: state.last_capsule_eaten(),
            score: state.score(),
            score_change: state.score_change(),
            lives: state.lives(),
            agents,
            events: state.events().to_vec(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DiffRecorder {
    diffs: Vec<StateDiff>,
    finished: bool,
}

impl DiffRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diffs(&self) -> &[StateDiff] {
        &self.diffs
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Display for DiffRecorder {
    fn initialize(&mut self, state: &GameState) {
        self.diffs.clear();
        self.finished = false;
        self.diffs.push(StateDiff::from_state(0, state));
    }

    fn update(&mut self, state: &GameState) {
        let turn = self.diffs.len() as u64;
        self.diffs.push(StateDiff::from_state(turn, state));
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
