use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tested_trait::{test_impl, tested_trait};

/// Source of the per-round orderings used by the sampler.
#[tested_trait]
pub trait Permuter: Sized {
    fn from_seed(seed: u64) -> Self;

    /// A permutation of `0..len`.
    fn permutation(&mut self, len: usize) -> Vec<usize>;

    /// `previous` reordered so that no element stays at its position, for two or
    /// more elements. Position `cycle[k]` takes the element from `cycle[k + 1]`,
    /// and a single cycle through every position has no fixed point.
    /// `FixedPermuter` overrides this to keep `previous` as is.
    fn rearrange(&mut self, previous: &[usize]) -> Vec<usize> {
        let len = previous.len();
        let cycle = self.permutation(len);
        let mut next = previous.to_vec();
        for k in 0..len {
            next[cycle[k]] = previous[cycle[(k + 1) % len]];
        }
        next
    }

    #[test]
    fn yields_permutations() {
        let mut permuter = Self::from_seed(17);
        for len in [0, 1, 2, 5, 32] {
            let mut order = permuter.permutation(len);
            assert_eq!(order.len(), len);
            order.sort_unstable();
            assert_eq!(order, (0..len).collect::<Vec<_>>());
        }
    }

    #[test]
    fn rearrange_keeps_the_elements() {
        let mut permuter = Self::from_seed(23);
        for previous in [vec![], vec![0], vec![2, 0, 1], vec![4, 1, 3, 0, 2]] {
            let mut next = permuter.rearrange(&previous);
            next.sort_unstable();
            assert_eq!(next, (0..previous.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Self::from_seed(99);
        let mut b = Self::from_seed(99);
        for len in [3, 7, 7, 4] {
            assert_eq!(a.permutation(len), b.permutation(len));
        }
    }
}

/// Uniformly random orderings from a seeded `StdRng`.
pub struct SeededPermuter {
    rng: StdRng,
}

#[test_impl]
impl Permuter for SeededPermuter {
    fn from_seed(seed: u64) -> Self {
        SeededPermuter {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

/// Always discovery order. Reproduces the order-biased schedule for comparison runs.
pub struct FixedPermuter;

#[test_impl]
impl Permuter for FixedPermuter {
    fn from_seed(_seed: u64) -> Self {
        FixedPermuter
    }

    fn permutation(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }

    fn rearrange(&mut self, previous: &[usize]) -> Vec<usize> {
        previous.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_orders_vary_between_draws() {
        let mut permuter = SeededPermuter::from_seed(3);
        let draws: Vec<_> = (0..20).map(|_| permuter.permutation(6)).collect();
        assert!(draws.iter().any(|d| d != &draws[0]));
    }

    #[test]
    fn seeded_rearrange_moves_every_element() {
        let mut permuter = SeededPermuter::from_seed(42);
        for len in 2..10 {
            let previous = permuter.permutation(len);
            for _ in 0..20 {
                let next = permuter.rearrange(&previous);
                for (before, after) in previous.iter().zip(&next) {
                    assert_ne!(before, after, "{previous:?} -> {next:?}");
                }
            }
        }
    }

    #[test]
    fn fixed_rearrange_keeps_order() {
        assert_eq!(FixedPermuter.rearrange(&[2, 0, 1]), vec![2, 0, 1]);
    }

    #[test]
    fn fixed_is_identity() {
        assert_eq!(FixedPermuter::from_seed(0).permutation(4), vec![0, 1, 2, 3]);
    }
}
