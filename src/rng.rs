use crate::types::Direction;

#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }

    pub fn pick_direction(&mut self, options: &[Direction]) -> Option<Direction> {
        if options.is_empty() {
            return None;
        }
        Some(options[self.pick_index(options.len())])
    }

    pub fn sample_weighted<T: Copy>(&mut self, weighted: &[(T, f64)]) -> Option<T> {
        let total: f64 = weighted.iter().map(|(_, w)| w.max(0.0)).sum();
        let last = weighted.last()?;
        if total <= 0.0 {
            return Some(last.0);
        }
        let target = self.next_f64() * total;
        let mut cumulative = 0.0;
        for (item, weight) in weighted {
            cumulative += weight.max(0.0);
            if target < cumulative {
                return Some(*item);
            }
        }
        Some(last.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut rng = Rng::new(123);
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn weighted_sampling_never_returns_zero_weight_items() {
        let mut rng = Rng::new(99);
        let weighted = [(Direction::Up, 0.0), (Direction::Left, 1.0), (Direction::Down, 0.0)];
        for _ in 0..500 {
            assert_eq!(rng.sample_weighted(&weighted), Some(Direction::Left));
        }
        assert_eq!(rng.sample_weighted::<Direction>(&[]), None);
    }

    #[test]
    fn weighted_sampling_follows_weights() {
        let mut rng = Rng::new(2024);
        let weighted = [(0usize, 0.8), (1usize, 0.2)];
        let mut hits = [0usize; 2];
        for _ in 0..10_000 {
            let idx = rng.sample_weighted(&weighted).expect("non-empty");
            hits[idx] += 1;
        }
        assert!(hits[0] > 7_500 && hits[0] < 8_500, "hits: {hits:?}");
    }

    #[test]
    fn pick_direction_covers_all_options() {
        let mut rng = Rng::new(5);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let dir = rng.pick_direction(&Direction::MOVES).expect("non-empty");
            let idx = Direction::MOVES.iter().position(|d| *d == dir).expect("known");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
        assert_eq!(rng.pick_direction(&[]), None);
    }
}
