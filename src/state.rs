use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use crate::constants::PACMAN_INDEX;
use crate::engine::EngineOptions;
use crate::error::LayoutError;
use crate::grid::Grid;
use crate::layout::Layout;
use crate::types::{AgentState, Configuration, Direction, Position, RuleEvent, Vec2};

#[derive(Clone, Debug)]
pub(crate) struct GameStateData {
    pub(crate) layout: Arc<Layout>,
    pub(crate) food: Grid,
    pub(crate) capsules: Vec<Vec2>,
    pub(crate) agents: Vec<AgentState>,
    pub(crate) score: i64,
    pub(crate) score_change: i64,
    pub(crate) lives: i32,
    pub(crate) ghosts_eaten_in_row: u32,
    pub(crate) win: bool,
    pub(crate) lose: bool,
    pub(crate) round_complete: bool,
    pub(crate) round: u32,
    pub(crate) agent_moved: Option<usize>,
    pub(crate) food_eaten: Option<Vec2>,
    pub(crate) capsule_eaten: Option<Vec2>,
    pub(crate) eaten: Vec<bool>,
    pub(crate) events: Vec<RuleEvent>,
}

impl GameStateData {
    pub(crate) fn next_turn(&self) -> Self {
        let mut next = self.clone();
        next.score_change = 0;
        next.agent_moved = None;
        next.food_eaten = None;
        next.capsule_eaten = None;
        next.events.clear();
        next
    }
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub(crate) data: GameStateData,
}

impl GameState {
    pub fn initialize(layout: &Layout, ghost_count: usize) -> Result<Self, LayoutError> {
        Self::initialize_with(Arc::new(layout.clone()), ghost_count, &EngineOptions::default())
    }

    /// Builds the initial snapshot. Exactly `ghost_count` ghosts are created;
    /// layout ghost starts are reused in order when there are fewer of them.
    pub fn initialize_with(
        layout: Arc<Layout>,
        ghost_count: usize,
        options: &EngineOptions,
    ) -> Result<Self, LayoutError> {
        if ghost_count > 0 && layout.ghost_starts.is_empty() {
            return Err(LayoutError::MissingGhostStart {
                requested: ghost_count,
            });
        }

        let mut agents = Vec::with_capacity(ghost_count + 1);
        agents.push(AgentState::new(Configuration::at(layout.pacman_start), true));
        for index in 0..ghost_count {
            let start = layout.ghost_starts[index % layout.ghost_starts.len()];
            agents.push(AgentState::new(Configuration::at(start), false));
        }

        Ok(Self {
            data: GameStateData {
                food: layout.food.clone(),
                capsules: layout.capsules.clone(),
                eaten: vec![false; agents.len()],
                agents,
                layout,
                score: 0,
                score_change: 0,
                lives: options.starting_lives,
                ghosts_eaten_in_row: 0,
                win: false,
                lose: false,
                round_complete: false,
                round: 1,
                agent_moved: None,
                food_eaten: None,
                capsule_eaten: None,
                events: Vec::new(),
            },
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.data.layout
    }

    pub(crate) fn shared_layout(&self) -> Arc<Layout> {
        Arc::clone(&self.data.layout)
    }

    pub fn num_agents(&self) -> usize {
        self.data.agents.len()
    }

    pub fn agent_state(&self, index: usize) -> Option<&AgentState> {
        self.data.agents.get(index)
    }

    pub fn agent_states(&self) -> &[AgentState] {
        &self.data.agents
    }

    pub fn pacman_state(&self) -> &AgentState {
        &self.data.agents[PACMAN_INDEX]
    }

    pub fn pacman_position(&self) -> Position {
        self.pacman_state().position()
    }

    pub fn pacman_direction(&self) -> Direction {
        self.pacman_state().direction()
    }

    pub fn ghost_state(&self, index: usize) -> Option<&AgentState> {
        if index == PACMAN_INDEX {
            return None;
        }
        self.data.agents.get(index)
    }

    pub fn ghost_states(&self) -> &[AgentState] {
        &self.data.agents[PACMAN_INDEX + 1..]
    }

    pub fn ghost_positions(&self) -> Vec<Position> {
        self.ghost_states().iter().map(|ghost| ghost.position()).collect()
    }

    pub fn score(&self) -> i64 {
        self.data.score
    }

    pub fn score_change(&self) -> i64 {
        self.data.score_change
    }

    pub fn lives(&self) -> i32 {
        self.data.lives
    }

    pub fn ghosts_eaten_in_row(&self) -> u32 {
        self.data.ghosts_eaten_in_row
    }

    pub fn num_food(&self) -> usize {
        self.data.food.count()
    }

    pub fn food(&self) -> &Grid {
        &self.data.food
    }

    pub fn has_food(&self, x: i32, y: i32) -> bool {
        self.data.food.get(x, y)
    }

    pub fn walls(&self) -> &Grid {
        &self.data.layout.walls
    }

    pub fn has_wall(&self, x: i32, y: i32) -> bool {
        self.data.layout.is_wall(Vec2::new(x, y))
    }

    pub fn capsules(&self) -> &[Vec2] {
        &self.data.capsules
    }

    pub fn is_win(&self) -> bool {
        self.data.win
    }

    pub fn is_lose(&self) -> bool {
        self.data.lose
    }

    pub fn is_terminal(&self) -> bool {
        self.data.win || self.data.lose
    }

    pub fn is_round_complete(&self) -> bool {
        self.data.round_complete
    }

    pub fn round(&self) -> u32 {
        self.data.round
    }

    pub fn last_agent_moved(&self) -> Option<usize> {
        self.data.agent_moved
    }

    pub fn last_food_eaten(&self) -> Option<Vec2> {
        self.data.food_eaten
    }

    pub fn last_capsule_eaten(&self) -> Option<Vec2> {
        self.data.capsule_eaten
    }

    pub fn was_eaten(&self, index: usize) -> bool {
        self.data.eaten.get(index).copied().unwrap_or(false)
    }

    pub fn events(&self) -> &[RuleEvent] {
        &self.data.events
    }

    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.data, &other.data);
        a.agents == b.agents
            && a.food == b.food
            && a.capsules == b.capsules
            && a.score == b.score
            && a.lives == b.lives
            && a.ghosts_eaten_in_row == b.ghosts_eaten_in_row
            && a.win == b.win
            && a.lose == b.lose
            && a.round_complete == b.round_complete
    }
}

impl Eq for GameState {}

impl Hash for GameState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let data = &self.data;
        data.agents.hash(state);
        data.food.hash(state);
        data.capsules.hash(state);
        data.score.hash(state);
        data.lives.hash(state);
        data.ghosts_eaten_in_row.hash(state);
        data.win.hash(state);
        data.lose.hash(state);
        data.round_complete.hash(state);
    }
}
