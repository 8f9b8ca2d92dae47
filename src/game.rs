use std::time::Instant;

use serde::Serialize;

use crate::agents::Agent;
use crate::display::Display;
use crate::engine::GameRules;
use crate::error::{AgentError, EngineError};
use crate::rng::Rng;
use crate::state::GameState;
use crate::types::{Direction, GameOutcome, RuleEvent};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GameOptions {
    #[serde(rename = "maxMoves")]
    pub max_moves: Option<u64>,
    #[serde(rename = "moveTimeoutMs")]
    pub move_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentFallback {
    pub turn: u64,
    pub agent: usize,
    pub reason: String,
    pub substituted: Direction,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnEvent {
    pub turn: u64,
    #[serde(flatten)]
    pub event: RuleEvent,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameSummary {
    pub outcome: Option<GameOutcome>,
    pub score: i64,
    pub lives: i32,
    pub rounds: u32,
    pub moves: u64,
    pub fallbacks: usize,
}

pub struct Game {
    rules: GameRules,
    state: GameState,
    agents: Vec<Box<dyn Agent>>,
    display: Box<dyn Display>,
    options: GameOptions,
    rng: Rng,
    next_agent: usize,
    num_moves: u64,
    move_history: Vec<(usize, Direction)>,
    fallbacks: Vec<AgentFallback>,
    events: Vec<TurnEvent>,
    outcome: Option<GameOutcome>,
    started: bool,
}

impl Game {
    pub fn new(
        rules: GameRules,
        agents: Vec<Box<dyn Agent>>,
        display: Box<dyn Display>,
        options: GameOptions,
        seed: u32,
    ) -> Result<Self, EngineError> {
        let state = rules.initial_state().clone();
        if agents.len() != state.num_agents() {
            return Err(EngineError::AgentCount {
                expected: state.num_agents(),
                found: agents.len(),
            });
        }
        if let Some(agent) = agents
            .iter()
            .enumerate()
            .find_map(|(position, agent)| (agent.index() != position).then_some(agent))
        {
            return Err(EngineError::AgentIndex {
                index: agent.index(),
                agents: agents.len(),
            });
        }

        Ok(Self {
            rules,
            state,
            agents,
            display,
            options,
            rng: Rng::new(seed),
            next_agent: 0,
            num_moves: 0,
            move_history: Vec::new(),
            fallbacks: Vec::new(),
            events: Vec::new(),
            outcome: None,
            started: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn num_moves(&self) -> u64 {
        self.num_moves
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn move_history(&self) -> &[(usize, Direction)] {
        &self.move_history
    }

    pub fn fallbacks(&self) -> &[AgentFallback] {
        &self.fallbacks
    }

    pub fn drain_events(&mut self) -> Vec<TurnEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            outcome: self.outcome,
            score: self.state.score(),
            lives: self.state.lives(),
            rounds: self.state.round(),
            moves: self.num_moves,
            fallbacks: self.fallbacks.len(),
        }
    }

    pub fn run(&mut self) -> Result<GameOutcome, EngineError> {
        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    pub fn step(&mut self) -> Result<Option<GameOutcome>, EngineError> {
        if let Some(outcome) = self.outcome {
            return Ok(Some(outcome));
        }
        if !self.started {
            self.started = true;
            self.display.initialize(&self.state);
        }
        if let Some(limit) = self.options.max_moves {
            if self.num_moves >= limit {
                return Ok(Some(self.finish(GameOutcome::MoveLimit)));
            }
        }

        let index = self.next_agent;
        let action = self.decide(index);
        let next = self.state.generate_successor(index, action)?;
        self.move_history.push((index, action));
        self.num_moves += 1;
        self.display.update(&next);

        self.state = self.rules.process(&next);
        let turn = self.num_moves;
        self.events.extend(
            self.state
                .events()
                .iter()
                .cloned()
                .map(|event| TurnEvent { turn, event }),
        );
        self.next_agent = (index + 1) % self.agents.len();

        match GameRules::outcome(&self.state) {
            Some(outcome) => Ok(Some(self.finish(outcome))),
            None => Ok(None),
        }
    }

    fn finish(&mut self, outcome: GameOutcome) -> GameOutcome {
        self.outcome = Some(outcome);
        self.display.finish();
        outcome
    }

    fn decide(&mut self, index: usize) -> Direction {
        let legal = self.state.legal_actions(index);
        let started = Instant::now();
        let decision = self.agents[index].get_action(&self.state);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let failure = match decision {
            Ok(_) if self.options.move_timeout_ms.is_some_and(|limit| elapsed_ms > limit) => {
                AgentError::Timeout {
                    agent: index,
                    elapsed_ms,
                    limit_ms: self.options.move_timeout_ms.unwrap_or_default(),
                }
            }
            Ok(action) if legal.contains(&action) => return action,
            Ok(Direction::Stop) if legal.is_empty() => return Direction::Stop,
            Ok(action) => AgentError::Failed {
                agent: index,
                message: format!("illegal action {}", action.as_str()),
            },
            Err(error) => error,
        };

        let substituted = if legal.is_empty() || legal.contains(&Direction::Stop) {
            Direction::Stop
        } else {
            self.rng.pick_direction(&legal).unwrap_or(Direction::Stop)
        };
        self.fallbacks.push(AgentFallback {
            turn: self.num_moves + 1,
            agent: index,
            reason: failure.to_string(),
            substituted,
        });
        substituted
    }
}
