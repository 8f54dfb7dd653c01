//! Weighted running statistics
//!
//! [`RunningStats`] combines groups of samples described only by their mean,
//! variance and count, using the pairwise update of Chan et al. This lets the
//! planner aggregate per-projection weight and delay statistics without ever
//! materialising individual synapses.

/// Running mean and variance over groups of items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single sample
    pub fn add_item(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    /// Add `n_items` samples with the given mean and (sample) variance.
    ///
    /// Groups with no items are ignored.
    pub fn add_items(&mut self, mean: f64, variance: f64, n_items: u64) {
        if n_items == 0 {
            return;
        }
        let total = self.count + n_items;
        let group_m2 = variance * (n_items as f64 - 1.0);
        let delta = mean - self.mean;
        let (n_a, n_b, n) = (self.count as f64, n_items as f64, total as f64);
        self.mean = (n_a * self.mean + n_b * mean) / n;
        self.m2 += group_m2 + delta * delta * n_a * n_b / n;
        self.count = total;
    }

    /// Total number of items seen
    pub fn n_items(&self) -> u64 {
        self.count
    }

    /// Mean of all items (0 when empty)
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (0 with fewer than two items)
    pub fn variance(&self) -> f64 {
        if self.count <= 1 {
            return 0.0;
        }
        self.m2 / (self.count as f64 - 1.0)
    }

    /// Sample standard deviation
    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_empty_stats() {
        let stats = RunningStats::new();
        assert_eq!(stats.n_items(), 0);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.variance(), 0.0);
    }

    #[test]
    fn test_single_items_match_direct_computation() {
        let data = [1.0, 2.0, 4.0, 8.0, 16.0];
        let mut stats = RunningStats::new();
        for x in data {
            stats.add_item(x);
        }
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() as f64 - 1.0);
        assert!(close(stats.mean(), mean));
        assert!(close(stats.variance(), var));
    }

    #[test]
    fn test_grouped_items_match_flat_items() {
        let a = [1.0, 3.0, 5.0];
        let b = [2.0, 2.5, 9.0, 11.0];

        let mut flat = RunningStats::new();
        a.iter().chain(b.iter()).for_each(|x| flat.add_item(*x));

        let group = |xs: &[f64]| {
            let mut s = RunningStats::new();
            xs.iter().for_each(|x| s.add_item(*x));
            s
        };
        let (ga, gb) = (group(&a), group(&b));
        let mut grouped = RunningStats::new();
        grouped.add_items(ga.mean(), ga.variance(), ga.n_items());
        grouped.add_items(gb.mean(), gb.variance(), gb.n_items());

        assert_eq!(grouped.n_items(), flat.n_items());
        assert!(close(grouped.mean(), flat.mean()));
        assert!(close(grouped.variance(), flat.variance()));
    }

    #[test]
    fn test_zero_variance_groups_with_equal_means() {
        let mut stats = RunningStats::new();
        stats.add_items(0.0, 0.0, 100);
        stats.add_items(0.0, 0.0, 50);
        assert_eq!(stats.n_items(), 150);
        assert_eq!(stats.variance(), 0.0);
    }

    #[test]
    fn test_empty_group_ignored() {
        let mut stats = RunningStats::new();
        stats.add_items(3.0, 1.0, 10);
        let before = stats.clone();
        stats.add_items(100.0, 50.0, 0);
        assert_eq!(stats, before);
    }

    proptest::proptest! {
        #[test]
        fn split_point_does_not_change_result(
            data in proptest::collection::vec(-1000.0f64..1000.0, 2..40),
            split in 0usize..40,
        ) {
            let split = split.min(data.len());
            let mut flat = RunningStats::new();
            data.iter().for_each(|x| flat.add_item(*x));

            let mut left = RunningStats::new();
            data[..split].iter().for_each(|x| left.add_item(*x));
            let mut right = RunningStats::new();
            data[split..].iter().for_each(|x| right.add_item(*x));

            let mut grouped = RunningStats::new();
            grouped.add_items(left.mean(), left.variance(), left.n_items());
            grouped.add_items(right.mean(), right.variance(), right.n_items());

            proptest::prop_assert_eq!(grouped.n_items(), flat.n_items());
            proptest::prop_assert!((grouped.mean() - flat.mean()).abs() <= 1e-6);
            proptest::prop_assert!(
                (grouped.variance() - flat.variance()).abs() <= 1e-6 * flat.variance().max(1.0)
            );
        }
    }
}
