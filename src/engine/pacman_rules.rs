use crate::constants::{
    scared_time_for_streak, CAPSULE_POINTS, FOOD_POINTS, GRID_SNAP_TOLERANCE, PACMAN_INDEX,
    PACMAN_SPEED,
};
use crate::error::EngineError;
use crate::layout::Layout;
use crate::state::GameState;
use crate::types::{Configuration, Direction, RuleEvent, Vec2};

use super::utils::possible_actions;

pub(super) fn legal_actions(state: &GameState) -> Vec<Direction> {
    let layout = state.layout();
    possible_actions(&state.pacman_state().config, |cell| {
        layout.is_passable_for_pacman(cell)
    })
}

pub(super) fn apply_action(state: &mut GameState, action: Direction) -> Result<(), EngineError> {
    if !legal_actions(state).contains(&action) {
        return Err(EngineError::IllegalAction {
            agent: PACMAN_INDEX,
            action,
        });
    }

    let pacman = &mut state.data.agents[PACMAN_INDEX];
    pacman.config = pacman.config.advanced(action, PACMAN_SPEED);
    let pos = pacman.config.pos;
    let nearest = pos.nearest_cell();
    if nearest.to_position().manhattan(pos) <= GRID_SNAP_TOLERANCE {
        let cell = teleport_through_portal(state, nearest);
        consume(state, cell);
    }
    Ok(())
}

fn teleport_through_portal(state: &mut GameState, cell: Vec2) -> Vec2 {
    let layout = state.shared_layout();
    let Some(far) = layout.paired_portal(cell) else {
        return cell;
    };
    let arrival = portal_arrival(&layout, far);
    let pacman = &mut state.data.agents[PACMAN_INDEX];
    pacman.config = Configuration {
        pos: arrival.to_position(),
        dir: pacman.config.dir,
    };
    state.data.events.push(RuleEvent::Teleported {
        from: cell,
        to: arrival,
    });
    arrival
}

/// Arrival cell next to `portal`: toward the vertical center first, then
/// away from it, then left, then right, else the portal itself.
pub(super) fn portal_arrival(layout: &Layout, portal: Vec2) -> Vec2 {
    // Rows grow downwards, so a portal below the center steps up (-1) to reach it.
    let center_y = layout.height as f32 / 2.0;
    let toward_center = if portal.y as f32 > center_y { -1 } else { 1 };
    [
        Vec2::new(portal.x, portal.y + toward_center),
        Vec2::new(portal.x, portal.y - toward_center),
        Vec2::new(portal.x - 1, portal.y),
        Vec2::new(portal.x + 1, portal.y),
    ]
    .into_iter()
    .find(|cell| !layout.is_wall(*cell))
    .unwrap_or(portal)
}

fn consume(state: &mut GameState, cell: Vec2) {
    let data = &mut state.data;
    if data.food.at(cell) {
        data.food.set(cell.x, cell.y, false);
        data.score_change = data.score_change.saturating_add(FOOD_POINTS);
        data.food_eaten = Some(cell);
        data.events.push(RuleEvent::FoodEaten {
            x: cell.x,
            y: cell.y,
        });
        if data.food.count() == 0 && !data.lose {
            data.round_complete = true;
            data.events.push(RuleEvent::RoundComplete);
        }
    }

    if let Some(idx) = data.capsules.iter().position(|capsule| *capsule == cell) {
        data.capsules.remove(idx);
        data.capsule_eaten = Some(cell);
        data.score_change = data.score_change.saturating_add(CAPSULE_POINTS);
        let scared_time = scared_time_for_streak(data.ghosts_eaten_in_row);
        for ghost in data.agents.iter_mut().skip(PACMAN_INDEX + 1) {
            ghost.scared_timer = scared_time;
        }
        data.events.push(RuleEvent::CapsuleEaten {
            x: cell.x,
            y: cell.y,
            scared_time,
        });
    }
}
