//! Seeded RNG for reproducible workloads.
//!
//! xorshift64* state step; bounded draws use a 128-bit widening multiply so
//! ranges are free of modulo bias. Output is stable across platforms and
//! releases: a seed printed by a failing test reproduces the same tasks.
//! Not suitable for anything security related.

/// Single-word generator state (never zero).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Zero would lock xorshift at zero forever; it is replaced by a fixed
    /// odd constant.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform draw from `lo..=hi`.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    pub fn gen_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        match (hi - lo).checked_add(1) {
            Some(span) => lo + ((u128::from(self.next_u64()) * u128::from(span)) >> 64) as u64,
            // Full u64 range.
            None => self.next_u64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_fixes_the_stream() {
        let a: Vec<u64> = {
            let mut rng = SimRng::new(7);
            (0..16).map(|_| rng.next_u64()).collect()
        };
        let mut rng = SimRng::new(7);
        assert!(a.iter().all(|&v| v == rng.next_u64()));
    }

    #[test]
    fn zero_seed_still_produces_values() {
        assert_ne!(SimRng::new(0).next_u64(), 0);
    }

    #[test]
    fn inclusive_bounds_are_hit_and_respected() {
        let mut rng = SimRng::new(99);
        let draws: Vec<u64> = (0..2000).map(|_| rng.gen_inclusive(3, 8)).collect();
        assert!(draws.iter().all(|v| (3..=8).contains(v)));
        assert!(draws.contains(&3) && draws.contains(&8));
        assert_eq!(rng.gen_inclusive(5, 5), 5);
        rng.gen_inclusive(0, u64::MAX);
    }
}
