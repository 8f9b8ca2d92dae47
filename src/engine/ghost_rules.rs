use crate::constants::{
    ghost_points_for_streak, COLLISION_TOLERANCE, GHOST_SPEED, LOSS_PENALTY, PACMAN_INDEX,
    RESPAWN_TIME, SCARED_GHOST_SPEED_FACTOR,
};
use crate::error::EngineError;
use crate::state::GameState;
use crate::types::{AgentState, Configuration, Direction, RuleEvent};

use super::utils::possible_actions;

pub(super) fn legal_actions(state: &GameState, ghost_index: usize) -> Vec<Direction> {
    let Some(ghost) = state.ghost_state(ghost_index) else {
        return Vec::new();
    };
    if !ghost.is_active() {
        return Vec::new();
    }
    let layout = state.layout();
    let mut actions = possible_actions(&ghost.config, |cell| !layout.is_wall(cell));
    actions.retain(|action| *action != Direction::Stop);
    let reverse = ghost.config.dir.reverse();
    if actions.len() > 1 && actions.contains(&reverse) {
        actions.retain(|action| *action != reverse);
    }
    actions
}

pub(super) fn apply_action(
    state: &mut GameState,
    action: Direction,
    ghost_index: usize,
) -> Result<(), EngineError> {
    let legal = legal_actions(state, ghost_index);
    let ghost = &mut state.data.agents[ghost_index];

    // Inert or boxed-in ghosts only wait; waiting counts down a respawn.
    if legal.is_empty() {
        if action != Direction::Stop {
            return Err(EngineError::IllegalAction {
                agent: ghost_index,
                action,
            });
        }
        ghost.respawn_timer = ghost.respawn_timer.saturating_sub(1);
        return Ok(());
    }

    if !legal.contains(&action) {
        return Err(EngineError::IllegalAction {
            agent: ghost_index,
            action,
        });
    }
    let speed = if ghost.is_scared() {
        GHOST_SPEED * SCARED_GHOST_SPEED_FACTOR
    } else {
        GHOST_SPEED
    };
    ghost.config = ghost.config.advanced(action, speed);
    Ok(())
}

pub(super) fn decrement_timer(ghost: &mut AgentState) {
    if ghost.scared_timer == 1 {
        ghost.config = Configuration {
            pos: ghost.config.pos.nearest_cell().to_position(),
            dir: ghost.config.dir,
        };
    }
    ghost.scared_timer = ghost.scared_timer.saturating_sub(1);
}

/// Resolves contacts between the controllable agent and every active ghost.
/// The ghost that just moved is tested first.
pub(super) fn check_death(state: &mut GameState, moved_index: usize) {
    let ghost_count = state.num_agents().saturating_sub(1);
    let mut order: Vec<usize> = (1..=ghost_count).collect();
    if moved_index != PACMAN_INDEX {
        if let Some(pos) = order.iter().position(|idx| *idx == moved_index) {
            order.remove(pos);
            order.insert(0, moved_index);
        }
    }

    for ghost_index in order {
        if state.data.lose {
            break;
        }
        let ghost = &state.data.agents[ghost_index];
        if !ghost.is_active() {
            continue;
        }
        let distance = ghost.position().manhattan(state.pacman_position());
        if distance <= COLLISION_TOLERANCE {
            collide(state, ghost_index);
        }
    }
}

fn collide(state: &mut GameState, ghost_index: usize) {
    let data = &mut state.data;
    if data.agents[ghost_index].is_scared() {
        data.ghosts_eaten_in_row = data.ghosts_eaten_in_row.saturating_add(1);
        let points = ghost_points_for_streak(data.ghosts_eaten_in_row);
        data.score_change = data.score_change.saturating_add(points);
        let ghost = &mut data.agents[ghost_index];
        ghost.reset_to_start();
        ghost.scared_timer = 0;
        ghost.respawn_timer = RESPAWN_TIME;
        data.eaten[ghost_index] = true;
        data.events.push(RuleEvent::GhostEaten {
            ghost: ghost_index,
            points,
            streak: data.ghosts_eaten_in_row,
        });
        return;
    }

    if data.win {
        return;
    }
    data.lives -= 1;
    data.events.push(RuleEvent::PacmanCaught {
        ghost: ghost_index,
        lives_left: data.lives.max(0),
    });
    if data.lives <= 0 {
        data.score_change = data.score_change.saturating_sub(LOSS_PENALTY);
        data.lose = true;
        data.events.push(RuleEvent::GameLost);
        return;
    }

    // Life lost: everyone back to start, respawn countdowns keep running.
    for agent in data.agents.iter_mut() {
        agent.reset_to_start();
        if !agent.is_pacman {
            agent.scared_timer = 0;
        }
    }
    data.ghosts_eaten_in_row = 0;
}
