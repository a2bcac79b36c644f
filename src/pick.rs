use rand::Rng;

/// One-pass weighted choice. Each offered candidate replaces the current
/// pick when a uniform draw in `[0, accumulated)` falls below its weight, so
/// every candidate ends up chosen with probability `weight / total`.
#[derive(Debug)]
pub struct WeightedPick<T> {
    total: u64,
    choice: Option<T>,
}

impl<T> Default for WeightedPick<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeightedPick<T> {
    pub fn new() -> Self {
        Self {
            total: 0,
            choice: None,
        }
    }

    /// Zero weights are ignored.
    pub fn offer<R: Rng + ?Sized>(&mut self, item: T, weight: u64, rng: &mut R) {
        if weight == 0 {
            return;
        }
        self.total += weight;
        if rng.gen_range(0..self.total) < weight {
            self.choice = Some(item);
        }
    }

    pub fn into_choice(self) -> Option<T> {
        self.choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pick(weights: &[u64], rng: &mut StdRng) -> Option<usize> {
        let mut picker = WeightedPick::new();
        for (i, &w) in weights.iter().enumerate() {
            picker.offer(i, w, rng);
        }
        picker.into_choice()
    }

    #[test]
    fn single_candidate_always_wins() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(pick(&[3], &mut rng), Some(0));
        }
    }

    #[test]
    fn nothing_to_pick() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick(&[], &mut rng), None);
        assert_eq!(pick(&[0, 0], &mut rng), None);
        assert_eq!(pick(&[0, 5, 0], &mut rng), Some(1));
    }

    #[test]
    fn follows_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 2];
        for _ in 0..20_000 {
            counts[pick(&[10, 90], &mut rng).unwrap()] += 1;
        }
        let ratio = counts[1] as f64 / counts[0] as f64;
        assert!((7.5..10.8).contains(&ratio), "ratio {ratio}, counts {counts:?}");
    }

    #[test]
    fn same_seed_same_choice() {
        let weights = [5, 17, 3, 40, 11];
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..50).map(|_| pick(&weights, &mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..50).map(|_| pick(&weights, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn large_totals() {
        let mut rng = StdRng::seed_from_u64(3);
        let weights = [u64::from(u16::MAX); 100];
        assert!(pick(&weights, &mut rng).is_some());
    }
}
