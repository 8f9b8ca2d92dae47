use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::types::Vec2;

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Arc<Vec<bool>>,
    count: usize,
    fingerprint: u64,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width: width.max(0),
            height: height.max(0),
            cells: Arc::new(vec![false; len]),
            count: 0,
            fingerprint: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        self.index_of(x, y)
            .and_then(|idx| self.cells.get(idx).copied())
            .unwrap_or(false)
    }

    pub fn at(&self, cell: Vec2) -> bool {
        self.get(cell.x, cell.y)
    }

    pub fn set(&mut self, x: i32, y: i32, value: bool) -> bool {
        let Some(idx) = self.index_of(x, y) else {
            return false;
        };
        if self.cells[idx] == value {
            return true;
        }
        Arc::make_mut(&mut self.cells)[idx] = value;
        self.fingerprint ^= cell_key(idx);
        if value {
            self.count += 1;
        } else {
            self.count -= 1;
        }
        true
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn shares_buffer_with(&self, other: &Grid) -> bool {
        Arc::ptr_eq(&self.cells, &other.cells)
    }

    pub fn as_list(&self) -> Vec<Vec2> {
        let mut out = Vec::with_capacity(self.count);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    out.push(Vec2 { x, y });
                }
            }
        }
        out
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.count == other.count
            && self.fingerprint == other.fingerprint
            && (Arc::ptr_eq(&self.cells, &other.cells) || self.cells == other.cells)
    }
}

impl Eq for Grid {}

impl Hash for Grid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
        self.fingerprint.hash(state);
    }
}

// splitmix64 finalizer; xor-combined per set cell.
fn cell_key(idx: usize) -> u64 {
    let mut z = (idx as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
