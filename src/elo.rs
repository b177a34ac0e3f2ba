use serde::{Deserialize, Serialize};

use crate::error::MaiaError;

/// Rating buckets the network was trained with.
///
/// Ratings below `start` fall in category `0`, ratings at or above `end`
/// in the last category, and everything in between in `interval`-wide
/// half-open ranges `[lower, lower + interval)`.  The defaults
/// (1100, 2000, 100) give 11 categories:
///
/// - `< 1100` maps to `0`.
/// - `1100..=1199` maps to `1`, ..., `1900..=1999` maps to `9`.
/// - `>= 2000` maps to `10`.
///
/// `interval > 0` and `start <= end` always hold; deserialization goes
/// through [`EloBuckets::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEloBuckets", into = "RawEloBuckets")]
pub struct EloBuckets {
    start: i32,
    end: i32,
    interval: i32,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct RawEloBuckets {
    start: i32,
    end: i32,
    interval: i32,
}

impl Default for RawEloBuckets {
    fn default() -> Self {
        EloBuckets::default().into()
    }
}

impl From<EloBuckets> for RawEloBuckets {
    fn from(b: EloBuckets) -> Self {
        Self {
            start: b.start,
            end: b.end,
            interval: b.interval,
        }
    }
}

impl TryFrom<RawEloBuckets> for EloBuckets {
    type Error = MaiaError;

    fn try_from(raw: RawEloBuckets) -> Result<Self, MaiaError> {
        EloBuckets::new(raw.start, raw.end, raw.interval)
    }
}

impl Default for EloBuckets {
    fn default() -> Self {
        Self {
            start: 1100,
            end: 2000,
            interval: 100,
        }
    }
}

impl EloBuckets {
    pub fn new(start: i32, end: i32, interval: i32) -> Result<Self, MaiaError> {
        if interval <= 0 || end < start {
            return Err(MaiaError::Config(format!(
                "elo buckets need a positive interval and start <= end, \
                 got start={start} end={end} interval={interval}"
            )));
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn interval(&self) -> i32 {
        self.interval
    }

    /// Category index of a rating. Total over all integers.
    pub fn category_of(&self, elo: i32) -> i64 {
        let (elo, start, interval) = (elo as i64, self.start as i64, self.interval as i64);
        if elo < start {
            0
        } else if elo >= self.end as i64 {
            self.num_categories() as i64 - 1
        } else {
            1 + (elo - start) / interval
        }
    }

    /// Map a slice of ratings in one go.
    pub fn categories_of(&self, elos: &[i32]) -> Vec<i64> {
        elos.iter().map(|&e| self.category_of(e)).collect()
    }

    /// Total number of categories, including the two open-ended ones.
    pub fn num_categories(&self) -> usize {
        let span = self.end as i64 - self.start as i64;
        let interval = self.interval as i64;
        let inner = (span + interval - 1) / interval;
        inner as usize + 2
    }

    /// Human-readable label per category, in category order.
    pub fn labels(&self) -> Vec<String> {
        let (end, interval) = (self.end as i64, self.interval as i64);
        let mut labels = vec![format!("<{}", self.start)];
        let mut lower = self.start as i64;
        while lower < end {
            let upper = lower + interval;
            labels.push(format!("{}-{}", lower, upper - 1));
            lower = upper;
        }
        labels.push(format!(">={}", self.end));
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        let buckets = EloBuckets::default();
        assert_eq!(buckets.category_of(1099), 0);
        assert_eq!(buckets.category_of(1100), 1);
        assert_eq!(buckets.category_of(1199), 1);
        assert_eq!(buckets.category_of(1200), 2);
        assert_eq!(buckets.category_of(1999), 9);
        assert_eq!(buckets.category_of(2000), 10);
        assert_eq!(buckets.category_of(50000), 10);
        assert_eq!(buckets.category_of(-300), 0);
        assert_eq!(buckets.category_of(i32::MIN), 0);
        assert_eq!(buckets.category_of(i32::MAX), 10);
    }

    #[test]
    fn labels_line_up_with_categories() {
        let buckets = EloBuckets::default();
        let labels = buckets.labels();
        assert_eq!(labels.len(), buckets.num_categories());
        assert_eq!(labels[0], "<1100");
        assert_eq!(labels[1], "1100-1199");
        assert_eq!(labels[9], "1900-1999");
        assert_eq!(labels[10], ">=2000");
    }

    #[test]
    fn every_rating_lands_in_range() {
        let buckets = EloBuckets::default();
        let k = buckets.num_categories() as i64;
        for elo in (0..3000).step_by(7) {
            let c = buckets.category_of(elo);
            assert!((0..k).contains(&c), "{elo} -> {c}");
        }
    }

    #[test]
    fn custom_buckets() {
        let buckets = EloBuckets::new(1000, 1250, 100).unwrap();
        assert_eq!(buckets.num_categories(), 5);
        assert_eq!(buckets.category_of(1249), 3);
        assert_eq!(buckets.category_of(1250), 4);
        assert_eq!(buckets.categories_of(&[999, 1000, 1300]), vec![0, 1, 4]);
    }

    #[test]
    fn rejects_degenerate_buckets() {
        assert!(matches!(EloBuckets::new(1100, 2000, 0), Err(MaiaError::Config(_))));
        assert!(matches!(EloBuckets::new(1100, 2000, -100), Err(MaiaError::Config(_))));
        assert!(matches!(EloBuckets::new(2000, 1100, 100), Err(MaiaError::Config(_))));
        let empty = EloBuckets::new(1500, 1500, 100).unwrap();
        assert_eq!(empty.num_categories(), 2);
        assert_eq!(empty.category_of(1499), 0);
        assert_eq!(empty.category_of(1500), 1);
    }

    #[test]
    fn wide_ranges_do_not_overflow() {
        let buckets = EloBuckets::new(-2_000_000_000, 2_000_000_000, 1).unwrap();
        assert_eq!(buckets.num_categories(), 4_000_000_002);
        assert_eq!(buckets.category_of(2_000_000_000), 4_000_000_001);
        assert_eq!(buckets.category_of(1_999_999_999), 4_000_000_000);
        assert_eq!(buckets.category_of(i32::MIN), 0);

        let coarse = EloBuckets::new(i32::MIN, i32::MAX, i32::MAX).unwrap();
        assert_eq!(coarse.num_categories(), 5);
        assert_eq!(coarse.category_of(i32::MAX), 4);
        assert_eq!(coarse.category_of(-2), 1);
        assert_eq!(coarse.category_of(0), 2);
        assert_eq!(coarse.labels().len(), coarse.num_categories());
    }

    #[test]
    fn deserializes_through_validation() {
        let buckets: EloBuckets = serde_json::from_str(r#"{ "start": 1000 }"#).unwrap();
        assert_eq!((buckets.start(), buckets.end(), buckets.interval()), (1000, 2000, 100));
        assert!(serde_json::from_str::<EloBuckets>(r#"{ "interval": 0 }"#).is_err());
        let round_trip: EloBuckets =
            serde_json::from_str(&serde_json::to_string(&buckets).unwrap()).unwrap();
        assert_eq!(round_trip, buckets);
    }
}
