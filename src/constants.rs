pub const SCARED_TIME: u32 = 40;
pub const SCARED_TIME_DECAY_PER_GHOST: u32 = 2;
pub const RESPAWN_TIME: u32 = 16;

pub const COLLISION_TOLERANCE: f32 = 0.7;
pub const GRID_SNAP_TOLERANCE: f32 = 0.5;
pub const MID_CELL_TOLERANCE: f32 = 0.001;

pub const PACMAN_SPEED: f32 = 1.0;
pub const GHOST_SPEED: f32 = 1.0;
pub const SCARED_GHOST_SPEED_FACTOR: f32 = 0.5;

pub const FOOD_POINTS: i64 = 1;
pub const CAPSULE_POINTS: i64 = 5;
pub const GHOST_BASE_POINTS: i64 = 10;
pub const LOSS_PENALTY: i64 = 500;

pub const DEFAULT_LIVES: i32 = 3;
pub const DEFAULT_BEST_PROBABILITY: f64 = 0.8;

pub const PACMAN_INDEX: usize = 0;

pub fn scared_time_for_streak(ghosts_eaten_in_row: u32) -> u32 {
    SCARED_TIME.saturating_sub(ghosts_eaten_in_row.saturating_mul(SCARED_TIME_DECAY_PER_GHOST))
}

pub fn ghost_points_for_streak(ghosts_eaten_in_row: u32) -> i64 {
    2i64.checked_pow(ghosts_eaten_in_row)
        .and_then(|factor| factor.checked_mul(GHOST_BASE_POINTS))
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fright_duration_shrinks_by_two_per_ghost_and_floors_at_zero() {
        assert_eq!(scared_time_for_streak(0), 40);
        assert_eq!(scared_time_for_streak(2), 36);
        assert_eq!(scared_time_for_streak(19), 2);
        assert_eq!(scared_time_for_streak(20), 0);
        assert_eq!(scared_time_for_streak(u32::MAX), 0);
    }

    #[test]
    fn ghost_points_double_per_streak_step() {
        assert_eq!(ghost_points_for_streak(1), 20);
        assert_eq!(ghost_points_for_streak(2), 40);
        assert_eq!(ghost_points_for_streak(4), 160);
        assert_eq!(ghost_points_for_streak(200), i64::MAX);
    }
}
