use crate::constants::MID_CELL_TOLERANCE;
use crate::types::{Configuration, Direction, Vec2};

/// Candidate moves from `config`. Between grid points an agent may only keep
/// its heading; on a grid point every direction whose target cell is
/// passable qualifies, `Stop` included.
pub(super) fn possible_actions(
    config: &Configuration,
    passable: impl Fn(Vec2) -> bool,
) -> Vec<Direction> {
    let cell = config.pos.nearest_cell();
    if cell.to_position().manhattan(config.pos) > MID_CELL_TOLERANCE {
        return vec![config.dir];
    }
    Direction::ALL
        .into_iter()
        .filter(|dir| passable(cell.step(*dir)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    #[test]
    fn mid_cell_agents_keep_heading() {
        let config = Configuration {
            pos: Position::new(2.5, 1.0),
            dir: Direction::Right,
        };
        assert_eq!(possible_actions(&config, |_| true), vec![Direction::Right]);
    }

    #[test]
    fn grid_point_filters_by_passability() {
        let config = Configuration {
            pos: Position::new(1.0, 1.0),
            dir: Direction::Stop,
        };
        let open = Vec2::new(2, 1);
        let actions = possible_actions(&config, |cell| cell == open || cell == Vec2::new(1, 1));
        assert_eq!(actions, vec![Direction::Right, Direction::Stop]);
    }
}
