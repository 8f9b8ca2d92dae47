use std::collections::VecDeque;

use crate::constants::PACMAN_INDEX;
use crate::error::AgentError;
use crate::ghost_policy::{ActionDistribution, GhostPolicy};
use crate::rng::Rng;
use crate::state::GameState;
use crate::types::Direction;

pub trait Agent {
    fn index(&self) -> usize;

    fn name(&self) -> &str;

    fn get_action(&mut self, state: &GameState) -> Result<Direction, AgentError>;
}

#[derive(Clone, Debug)]
pub struct GhostAgent {
    index: usize,
    policy: GhostPolicy,
    rng: Rng,
}

impl GhostAgent {
    pub fn new(index: usize, policy: GhostPolicy, seed: u32) -> Self {
        Self {
            index,
            policy,
            rng: Rng::new(seed),
        }
    }

    pub fn policy(&self) -> GhostPolicy {
        self.policy
    }

    pub fn distribution(&self, state: &GameState) -> ActionDistribution {
        self.policy.distribution(state, self.index)
    }
}

impl Agent for GhostAgent {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        self.policy.as_str()
    }

    fn get_action(&mut self, state: &GameState) -> Result<Direction, AgentError> {
        Ok(self.distribution(state).sample(&mut self.rng))
    }
}

#[derive(Clone, Debug)]
pub struct RandomAgent {
    index: usize,
    rng: Rng,
}

impl RandomAgent {
    pub fn new(index: usize, seed: u32) -> Self {
        Self {
            index,
            rng: Rng::new(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        "random"
    }

    fn get_action(&mut self, state: &GameState) -> Result<Direction, AgentError> {
        let legal = state.legal_actions(self.index);
        Ok(self.rng.pick_direction(&legal).unwrap_or(Direction::Stop))
    }
}

#[derive(Clone, Debug)]
pub struct GreedyAgent {
    rng: Rng,
}

impl GreedyAgent {
    pub fn new(seed: u32) -> Self {
        Self { rng: Rng::new(seed) }
    }
}

impl Agent for GreedyAgent {
    fn index(&self) -> usize {
        PACMAN_INDEX
    }

    fn name(&self) -> &str {
        "greedy"
    }

    fn get_action(&mut self, state: &GameState) -> Result<Direction, AgentError> {
        let legal = state.legal_actions(PACMAN_INDEX);
        let Some(mut best_action) = self.rng.pick_direction(&legal) else {
            return Ok(Direction::Stop);
        };
        let food = state.food().as_list();
        if food.is_empty() {
            return Ok(best_action);
        }

        let mut best_distance = f32::INFINITY;
        for action in legal {
            let Ok(next) = state.generate_successor(PACMAN_INDEX, action) else {
                continue;
            };
            let pos = next.pacman_position();
            let distance = food
                .iter()
                .map(|cell| cell.to_position().manhattan(pos))
                .fold(f32::INFINITY, f32::min);
            if distance < best_distance {
                best_distance = distance;
                best_action = action;
            }
        }
        Ok(best_action)
    }
}

#[derive(Clone, Debug)]
pub struct ScriptedAgent {
    index: usize,
    actions: VecDeque<Direction>,
}

impl ScriptedAgent {
    pub fn new(index: usize, actions: impl IntoIterator<Item = Direction>) -> Self {
        Self {
            index,
            actions: actions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

impl Agent for ScriptedAgent {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn get_action(&mut self, _state: &GameState) -> Result<Direction, AgentError> {
        self.actions
            .pop_front()
            .ok_or(AgentError::NoDecision { agent: self.index })
    }
}

pub fn pacman_agent(kind: &str, seed: u32) -> Option<Box<dyn Agent>> {
    match kind {
        "greedy" => Some(Box::new(GreedyAgent::new(seed))),
        "random" => Some(Box::new(RandomAgent::new(PACMAN_INDEX, seed))),
        _ => None,
    }
}

pub fn ghost_agents(ghost_count: usize, policy: GhostPolicy, seed: u32) -> Vec<Box<dyn Agent>> {
    (1..=ghost_count)
        .map(|index| {
            let ghost_seed = seed.wrapping_add((index as u32).wrapping_mul(0x9e37_79b9));
            Box::new(GhostAgent::new(index, policy, ghost_seed)) as Box<dyn Agent>
        })
        .collect()
}
