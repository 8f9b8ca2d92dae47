use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BEST_PROBABILITY, GHOST_SPEED};
use crate::layout::Layout;
use crate::rng::Rng;
use crate::state::GameState;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GhostPolicy {
    Random,
    Directional {
        #[serde(rename = "probAttack")]
        prob_attack: f64,
        #[serde(rename = "probScaredFlee")]
        prob_scared_flee: f64,
    },
}

impl Default for GhostPolicy {
    fn default() -> Self {
        Self::directional()
    }
}

impl GhostPolicy {
    pub fn directional() -> Self {
        Self::Directional {
            prob_attack: DEFAULT_BEST_PROBABILITY,
            prob_scared_flee: DEFAULT_BEST_PROBABILITY,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "random" => Some(Self::Random),
            "directional" => Some(Self::directional()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Directional { .. } => "directional",
        }
    }

    pub fn distribution(&self, state: &GameState, ghost_index: usize) -> ActionDistribution {
        let legal = state.legal_actions(ghost_index);
        if legal.is_empty() {
            return ActionDistribution::certain(Direction::Stop);
        }
        match *self {
            Self::Random => ActionDistribution::uniform(&legal),
            Self::Directional {
                prob_attack,
                prob_scared_flee,
            } => directional_distribution(
                state,
                ghost_index,
                &legal,
                prob_attack,
                prob_scared_flee,
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActionDistribution {
    entries: Vec<(Direction, f64)>,
}

impl ActionDistribution {
    pub fn certain(action: Direction) -> Self {
        Self {
            entries: vec![(action, 1.0)],
        }
    }

    pub fn uniform(actions: &[Direction]) -> Self {
        let weight = 1.0 / actions.len().max(1) as f64;
        Self {
            entries: actions.iter().map(|action| (*action, weight)).collect(),
        }
    }

    fn normalized(mut entries: Vec<(Direction, f64)>) -> Self {
        let total: f64 = entries.iter().map(|(_, p)| *p).sum();
        if total > 0.0 {
            for (_, p) in entries.iter_mut() {
                *p /= total;
            }
        }
        Self { entries }
    }

    pub fn probability(&self, action: Direction) -> f64 {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == action)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    pub fn entries(&self) -> &[(Direction, f64)] {
        &self.entries
    }

    pub fn actions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.entries.iter().map(|(action, _)| *action)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn most_likely(&self) -> Option<Direction> {
        self.entries
            .iter()
            .fold(None, |best: Option<(Direction, f64)>, (action, p)| match best {
                Some((_, best_p)) if best_p >= *p => best,
                _ => Some((*action, *p)),
            })
            .map(|(action, _)| action)
    }

    pub fn sample(&self, rng: &mut Rng) -> Direction {
        rng.sample_weighted(&self.entries).unwrap_or(Direction::Stop)
    }
}

fn directional_distribution(
    state: &GameState,
    ghost_index: usize,
    legal: &[Direction],
    prob_attack: f64,
    prob_scared_flee: f64,
) -> ActionDistribution {
    let Some(ghost) = state.ghost_state(ghost_index) else {
        return ActionDistribution::uniform(legal);
    };
    let scared = ghost.is_scared();
    let ghost_pos = ghost.position();
    let target = state.pacman_position();

    let mut best = if scared {
        distance_fallback(state, ghost_index, legal, true)
    } else {
        let start = ghost_pos.nearest_cell();
        let goal = target.nearest_cell();
        match shortest_path(state.layout(), start, goal).and_then(|path| path.first().copied()) {
            Some(step) if legal.contains(&step) => vec![step],
            _ => distance_fallback(state, ghost_index, legal, false),
        }
    };
    if best.is_empty() {
        best = legal.to_vec();
    }

    let best_prob = if scared { prob_scared_flee } else { prob_attack };
    let share = best_prob / best.len() as f64;
    let base = (1.0 - best_prob) / legal.len() as f64;
    let entries = legal
        .iter()
        .map(|action| {
            let bonus = if best.contains(action) { share } else { 0.0 };
            (*action, base + bonus)
        })
        .collect();
    ActionDistribution::normalized(entries)
}

fn distance_fallback(
    state: &GameState,
    ghost_index: usize,
    legal: &[Direction],
    flee: bool,
) -> Vec<Direction> {
    let Some(ghost) = state.ghost_state(ghost_index) else {
        return Vec::new();
    };
    let target = state.pacman_position();
    let scored: Vec<(Direction, f32)> = legal
        .iter()
        .map(|action| {
            let next = ghost.position().offset(*action, GHOST_SPEED);
            (*action, next.manhattan(target))
        })
        .collect();

    let pick = scored.iter().map(|(_, d)| *d).reduce(|a, b| {
        if flee {
            a.max(b)
        } else {
            a.min(b)
        }
    });
    let Some(pick) = pick else {
        return Vec::new();
    };
    scored
        .into_iter()
        .filter(|(_, d)| *d == pick)
        .map(|(action, _)| action)
        .collect()
}

pub fn shortest_path(layout: &Layout, start: Vec2, goal: Vec2) -> Option<Vec<Direction>> {
    if layout.is_wall(start) || layout.is_wall(goal) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<Vec2> = HashSet::new();
    let mut best_cost: HashMap<Vec2, i32> = HashMap::new();
    let mut came_from: HashMap<Vec2, (Vec2, Direction)> = HashMap::new();
    let mut seq: u64 = 0;

    best_cost.insert(start, 0);
    open.push(Reverse((start.manhattan(goal), seq, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == goal {
            return Some(rebuild_path(&came_from, start, goal));
        }
        if !closed.insert(current) {
            continue;
        }
        let cost = best_cost.get(&current).copied().unwrap_or(i32::MAX);

        for dir in Direction::MOVES {
            let next = current.step(dir);
            if layout.is_wall(next) || closed.contains(&next) {
                continue;
            }
            let next_cost = cost + 1;
            if next_cost < best_cost.get(&next).copied().unwrap_or(i32::MAX) {
                best_cost.insert(next, next_cost);
                came_from.insert(next, (current, dir));
                seq += 1;
                open.push(Reverse((next_cost + next.manhattan(goal), seq, next)));
            }
        }
    }

    None
}

fn rebuild_path(
    came_from: &HashMap<Vec2, (Vec2, Direction)>,
    start: Vec2,
    goal: Vec2,
) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        let Some((prev, dir)) = came_from.get(&current) else {
            break;
        };
        path.push(*dir);
        current = *prev;
    }
    path.reverse();
    path
}
