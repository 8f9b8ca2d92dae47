use thiserror::Error;

use crate::types::Direction;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("illegal action {action:?} for agent {agent}")]
    IllegalAction { agent: usize, action: Direction },

    #[error("cannot generate a successor of a terminal state")]
    TerminalState,

    #[error("agent index {index} out of range ({agents} agents)")]
    AgentIndex { index: usize, agents: usize },

    #[error("{found} agents supplied for a state with {expected} agents")]
    AgentCount { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile {tile:?} at ({x},{y})")]
    UnknownTile { tile: char, x: usize, y: usize },

    #[error("layout has no controllable agent start")]
    MissingPacman,

    #[error("layout has {count} controllable agent starts, expected exactly one")]
    DuplicatePacman { count: usize },

    #[error("layout has {count} portal cells, expected 0 or 2")]
    PortalCount { count: usize },

    #[error("{requested} ghosts requested but the layout has no ghost start")]
    MissingGhostStart { requested: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("agent {agent} exceeded its move time ({elapsed_ms} ms > {limit_ms} ms)")]
    Timeout {
        agent: usize,
        elapsed_ms: u64,
        limit_ms: u64,
    },

    #[error("agent {agent} has no decision left")]
    NoDecision { agent: usize },

    #[error("agent {agent} failed: {message}")]
    Failed { agent: usize, message: String },
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record json is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported record version {0}")]
    UnsupportedVersion(u8),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("replay diverged at move {turn}: {source}")]
    Replay {
        turn: usize,
        #[source]
        source: EngineError,
    },
}
