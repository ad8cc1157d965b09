//! Deterministic pseudo-random stream for reproducible resampling.

/// Linear-congruential generator over a 32-bit state.
///
/// Constants are the Numerical Recipes pair (multiplier 1664525,
/// increment 1013904223, modulus 2^32). Bootstrap confidence intervals
/// must be bit-identical across runs given the same seed, so this stays
/// a fixed hand-rolled recurrence rather than a library RNG whose stream
/// could change between versions.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        SeededRng { state: seed }
    }

    /// Next value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.state) / (u32::MAX as f64 + 1.0)
    }

    /// Uniform index in [0, n). Returns 0 for n == 0.
    pub fn next_index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let idx = (self.next_f64() * n as f64).floor() as usize;
        idx.min(n - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::new(1);
        let mut b = SeededRng::new(2);
        let a_vals: Vec<f64> = (0..8).map(|_| a.next_f64()).collect();
        let b_vals: Vec<f64> = (0..8).map(|_| b.next_f64()).collect();
        assert_ne!(a_vals, b_vals);
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut rng = SeededRng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn next_index_bounds() {
        let mut rng = SeededRng::new(99);
        for _ in 0..10_000 {
            assert!(rng.next_index(5) < 5);
        }
        assert_eq!(rng.next_index(0), 0);
    }
}
