use std::collections::{HashSet, VecDeque};

use crate::error::LayoutError;
use crate::grid::Grid;
use crate::types::Vec2;

pub const TILE_WALL: char = '%';
pub const TILE_FOOD: char = '.';
pub const TILE_CAPSULE: char = 'o';
pub const TILE_PACMAN: char = 'P';
pub const TILE_GHOST: char = 'G';
pub const TILE_PORTAL: char = 'Q';
pub const TILE_EMPTY: char = ' ';

pub const DEFAULT_LAYOUT: &str = "portal_classic";

const PORTAL_CLASSIC: &str = "\
%%%%%%%%%Q%%%%%%%%%
%o...............o%
%.%%%.%%%%%%%.%%%.%
%.................%
%.%%.%.%%G%%.%.%%.%
%....%...G...%....%
%%%%.%%%%%%%%%.%%%%
%.......P.........%
%.%%%.%%%%%%%.%%%.%
%o...............o%
%%%%%%%%%Q%%%%%%%%%";

const SMALL_ROOM: &str = "\
%%%%%%%
%P...o%
%.%%%.%
%....G%
%%%%%%%";

/// Static maze description. Rows are read top to bottom, so `y` grows
/// downwards. Portal cells keep their wall flag; only the controllable
/// agent may enter them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub walls: Grid,
    pub food: Grid,
    pub capsules: Vec<Vec2>,
    pub portals: Vec<Vec2>,
    pub pacman_start: Vec2,
    pub ghost_starts: Vec<Vec2>,
    rows: Vec<String>,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        Self::from_rows(rows.as_slice())
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, LayoutError> {
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };
        let expected = first.as_ref().chars().count();
        if expected == 0 {
            return Err(LayoutError::Empty);
        }

        let width = expected as i32;
        let height = rows.len() as i32;
        let mut walls = Grid::new(width, height);
        let mut food = Grid::new(width, height);
        let mut capsules = Vec::new();
        let mut portals = Vec::new();
        let mut pacman_starts = Vec::new();
        let mut ghost_starts = Vec::new();

        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(LayoutError::Ragged {
                    row: row_idx,
                    expected,
                    found,
                });
            }
            for (col_idx, tile) in row.chars().enumerate() {
                let cell = Vec2::new(col_idx as i32, row_idx as i32);
                match tile {
                    TILE_WALL => {
                        walls.set(cell.x, cell.y, true);
                    }
                    TILE_FOOD => {
                        food.set(cell.x, cell.y, true);
                    }
                    TILE_CAPSULE => capsules.push(cell),
                    TILE_PACMAN => pacman_starts.push(cell),
                    TILE_GHOST => ghost_starts.push(cell),
                    TILE_PORTAL => {
                        walls.set(cell.x, cell.y, true);
                        portals.push(cell);
                    }
                    TILE_EMPTY => {}
                    other => {
                        return Err(LayoutError::UnknownTile {
                            tile: other,
                            x: col_idx,
                            y: row_idx,
                        })
                    }
                }
            }
        }

        let pacman_start = match pacman_starts.as_slice() {
            [] => return Err(LayoutError::MissingPacman),
            [only] => *only,
            many => {
                return Err(LayoutError::DuplicatePacman { count: many.len() });
            }
        };
        if !(portals.is_empty() || portals.len() == 2) {
            return Err(LayoutError::PortalCount {
                count: portals.len(),
            });
        }

        Ok(Self {
            width,
            height,
            walls,
            food,
            capsules,
            portals,
            pacman_start,
            ghost_starts,
            rows: rows.iter().map(|row| row.as_ref().to_string()).collect(),
        })
    }

    pub fn builtin(name: &str) -> Option<Self> {
        let text = match name {
            "portal_classic" => PORTAL_CLASSIC,
            "small_room" => SMALL_ROOM,
            _ => return None,
        };
        Self::parse(text).ok()
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["portal_classic", "small_room"]
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn is_wall(&self, cell: Vec2) -> bool {
        !self.walls.in_bounds(cell.x, cell.y) || self.walls.at(cell)
    }

    pub fn is_portal(&self, cell: Vec2) -> bool {
        self.portals.contains(&cell)
    }

    pub fn is_passable_for_pacman(&self, cell: Vec2) -> bool {
        !self.is_wall(cell) || self.is_portal(cell)
    }

    pub fn paired_portal(&self, cell: Vec2) -> Option<Vec2> {
        match self.portals.as_slice() {
            [a, b] if *a == cell => Some(*b),
            [a, b] if *b == cell => Some(*a),
            _ => None,
        }
    }

    pub fn reachable_from(&self, start: Vec2) -> HashSet<Vec2> {
        let mut out = HashSet::new();
        if self.is_wall(start) {
            return out;
        }

        let mut queue = VecDeque::new();
        out.insert(start);
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            for next in [
                Vec2::new(cell.x - 1, cell.y),
                Vec2::new(cell.x + 1, cell.y),
                Vec2::new(cell.x, cell.y - 1),
                Vec2::new(cell.x, cell.y + 1),
            ] {
                if self.is_wall(next) {
                    continue;
                }
                if out.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_tile_kind() {
        let layout = Layout::parse("%%Q%%\n%P.o%\n% G %\n%%Q%%\n").expect("valid layout");
        assert_eq!(layout.width, 5);
        assert_eq!(layout.height, 4);
        assert_eq!(layout.pacman_start, Vec2::new(1, 1));
        assert_eq!(layout.ghost_starts, vec![Vec2::new(2, 2)]);
        assert_eq!(layout.capsules, vec![Vec2::new(3, 1)]);
        assert_eq!(layout.portals, vec![Vec2::new(2, 0), Vec2::new(2, 3)]);
        assert_eq!(layout.food.count(), 1);
        assert!(layout.food.get(2, 1));
        assert!(layout.is_wall(Vec2::new(2, 0)));
        assert!(layout.is_passable_for_pacman(Vec2::new(2, 0)));
        assert!(!layout.is_wall(Vec2::new(1, 2)));
        assert!(layout.is_wall(Vec2::new(-1, 2)));
    }

    #[test]
    fn paired_portal_resolves_both_ways() {
        let layout = Layout::builtin("portal_classic").expect("builtin layout");
        let [a, b] = [layout.portals[0], layout.portals[1]];
        assert_eq!(layout.paired_portal(a), Some(b));
        assert_eq!(layout.paired_portal(b), Some(a));
        assert_eq!(layout.paired_portal(layout.pacman_start), None);
    }

    #[test]
    fn rejects_malformed_layouts() {
        assert_eq!(Layout::parse(""), Err(LayoutError::Empty));
        assert_eq!(
            Layout::parse("%%%\n%P\n%%%"),
            Err(LayoutError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            Layout::parse("%%%\n%X%\n%%%"),
            Err(LayoutError::UnknownTile {
                tile: 'X',
                x: 1,
                y: 1
            })
        );
        assert_eq!(Layout::parse("%%%\n%.%\n%%%"), Err(LayoutError::MissingPacman));
        assert_eq!(
            Layout::parse("%%%%\n%PP%\n%%%%"),
            Err(LayoutError::DuplicatePacman { count: 2 })
        );
        assert_eq!(
            Layout::parse("%Q%%\n%P.%\n%%%%"),
            Err(LayoutError::PortalCount { count: 1 })
        );
    }

    #[test]
    fn builtin_layouts_have_reachable_food_and_capsules() {
        for name in Layout::builtin_names() {
            let layout = Layout::builtin(name).expect("builtin parses");
            let reachable = layout.reachable_from(layout.pacman_start);
            for cell in layout.food.as_list() {
                assert!(reachable.contains(&cell), "{name}: food at {cell:?} unreachable");
            }
            for cell in &layout.capsules {
                assert!(reachable.contains(cell), "{name}: capsule at {cell:?} unreachable");
            }
            for ghost in &layout.ghost_starts {
                assert!(reachable.contains(ghost), "{name}: ghost start {ghost:?} unreachable");
            }
        }
    }

    #[test]
    fn rows_round_trip_through_parse() {
        let layout = Layout::builtin("small_room").expect("builtin parses");
        let reparsed = Layout::from_rows(layout.rows()).expect("rows parse");
        assert_eq!(layout, reparsed);
    }
}
