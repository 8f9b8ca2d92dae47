use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::display::Display;
use crate::engine::{EngineOptions, GameRules};
use crate::error::RecordError;
use crate::game::Game;
use crate::layout::Layout;
use crate::state::GameState;
use crate::types::{Direction, GameOutcome};

pub const RECORD_VERSION: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedMove {
    pub agent: usize,
    pub action: Direction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub version: u8,
    #[serde(rename = "recordedAt")]
    pub recorded_at: String,
    pub layout: Vec<String>,
    #[serde(rename = "ghostCount")]
    pub ghost_count: usize,
    pub options: EngineOptions,
    #[serde(default)]
    pub seed: Option<u32>,
    pub moves: Vec<RecordedMove>,
    #[serde(rename = "finalScore")]
    pub final_score: i64,
    #[serde(default)]
    pub outcome: Option<GameOutcome>,
}

impl GameRecord {
    pub fn from_game(game: &Game, seed: Option<u32>) -> Self {
        let state = game.state();
        Self {
            version: RECORD_VERSION,
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            layout: state.layout().rows().to_vec(),
            ghost_count: state.num_agents() - 1,
            options: game.rules().options().clone(),
            seed,
            moves: game
                .move_history()
                .iter()
                .map(|(agent, action)| RecordedMove {
                    agent: *agent,
                    action: *action,
                })
                .collect(),
            final_score: state.score(),
            outcome: game.outcome(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let text = fs::read_to_string(path)?;
        let record: GameRecord = serde_json::from_str(&text)?;
        if record.version != RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }

    pub fn replay(&self, display: &mut dyn Display) -> Result<GameState, RecordError> {
        let layout = Layout::from_rows(self.layout.as_slice())?;
        let rules =
            GameRules::new_game(Arc::new(layout), self.ghost_count, self.options.clone())?;
        let mut state = rules.initial_state().clone();
        display.initialize(&state);
        for (turn, recorded) in self.moves.iter().enumerate() {
            let next = state
                .generate_successor(recorded.agent, recorded.action)
                .map_err(|source| RecordError::Replay {
                    turn: turn + 1,
                    source,
                })?;
            display.update(&next);
            state = rules.process(&next);
        }
        display.finish();
        Ok(state)
    }
}

pub fn record_file_path(dir: &Path, recorded_at: DateTime<Utc>, score: i64) -> PathBuf {
    dir.join(format!(
        "recorded-game-{}-{score}.json",
        recorded_at.format("%Y%m%dT%H%M%S%3fZ")
    ))
}
