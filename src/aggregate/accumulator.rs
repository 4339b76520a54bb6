//! The day-bucketing fold: a single forward pass that closes one [`DayBucket`] every
//! time an observation crosses the open bucket's day boundary.

use crate::store::daily_store::DayBucket;

/// Running state of the open day bucket.
///
/// Within a bucket the accumulator is updated by value ([`BucketAccumulator::absorb`]
/// consumes and returns it); at a boundary it is closed and replaced by a fresh one
/// seeded from the observation that crossed the boundary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BucketAccumulator {
    day_floor: f64,
    rain_total: f64,
    max: Vec<f64>,
    min: Vec<f64>,
}

impl BucketAccumulator {
    /// Opens a bucket at `day_floor` with every field's extremes set to `row`'s values.
    pub(crate) fn seed(day_floor: f64, columns: &[&[f64]], row: usize, rain: f64) -> Self {
        let values: Vec<f64> = columns.iter().map(|column| column[row]).collect();
        Self {
            day_floor,
            rain_total: rain,
            max: values.clone(),
            min: values,
        }
    }

    /// Whether an observation at `day_number` still belongs to this bucket.
    /// An observation exactly on the boundary does not.
    pub(crate) fn accepts(&self, day_number: f64, day_offset: f64) -> bool {
        day_number < self.day_floor + 1.0 + day_offset
    }

    pub(crate) fn absorb(mut self, columns: &[&[f64]], row: usize, rain: f64) -> Self {
        self.rain_total += rain;
        for ((max, min), column) in self.max.iter_mut().zip(self.min.iter_mut()).zip(columns) {
            let value = column[row];
            *max = raise(*max, value);
            *min = lower(*min, value);
        }
        self
    }

    pub(crate) fn close(self) -> DayBucket {
        DayBucket {
            day_number: self.day_floor,
            rain_total: self.rain_total,
            max: self.max,
            min: self.min,
        }
    }
}

// Ties keep the first-seen value. NaN marks a missing sample: it never wins, and a
// NaN extreme gives way to the first real value.
fn raise(current: f64, value: f64) -> f64 {
    if value > current || (current.is_nan() && !value.is_nan()) {
        value
    } else {
        current
    }
}

fn lower(current: f64, value: f64) -> f64 {
    if value < current || (current.is_nan() && !value.is_nan()) {
        value
    } else {
        current
    }
}

/// Folds the observations into day buckets.
///
/// `day_numbers`, every slice in `columns` and `rainfall` are index-aligned and hold at
/// least one observation. Rainfall must already have missing samples replaced by zero.
/// Observations are assumed to be in time order.
pub(crate) fn bucket_days(
    day_numbers: &[f64],
    columns: &[&[f64]],
    rainfall: &[f64],
    day_offset: f64,
) -> Vec<DayBucket> {
    let first = BucketAccumulator::seed(day_numbers[0].floor(), columns, 0, 0.0);

    let (mut closed, open) = day_numbers.iter().enumerate().fold(
        (Vec::new(), first),
        |(mut closed, open), (row, &day)| {
            if open.accepts(day, day_offset) {
                (closed, open.absorb(columns, row, rainfall[row]))
            } else {
                closed.push(open.close());
                let next = BucketAccumulator::seed(day.floor(), columns, row, rainfall[row]);
                (closed, next)
            }
        },
    );
    // The last bucket is never closed by a boundary crossing.
    closed.push(open.close());
    closed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_observations_make_two_buckets() {
        let days = [100.2, 100.9, 101.3];
        let temps = [70.0, 80.0, 60.0];
        let rain = [0.1, 0.2, 0.05];
        let buckets = bucket_days(&days, &[&temps[..], &rain[..]], &rain, 0.0);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day_number, 100.0);
        assert!((buckets[0].rain_total - 0.3).abs() < 1e-12);
        assert_eq!(buckets[0].max, vec![80.0, 0.2]);
        assert_eq!(buckets[0].min, vec![70.0, 0.1]);
        assert_eq!(buckets[1].day_number, 101.0);
        assert_eq!(buckets[1].rain_total, 0.05);
        assert_eq!(buckets[1].max, vec![60.0, 0.05]);
        assert_eq!(buckets[1].min, vec![60.0, 0.05]);
    }

    #[test]
    fn test_single_observation_is_one_bucket() {
        let buckets = bucket_days(&[5.5], &[&[42.0][..]], &[0.01], 0.25);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].day_number, 5.0);
        assert_eq!(buckets[0].max, buckets[0].min);
        assert_eq!(buckets[0].max, vec![42.0]);
        assert_eq!(buckets[0].rain_total, 0.01);
    }

    #[test]
    fn test_offset_moves_the_boundary_past_midnight() {
        // With a quarter-day offset, 10.2 still belongs to the day opened at 9.
        let days = [9.5, 10.2, 10.25, 10.9];
        let values = [1.0, 2.0, 3.0, 4.0];
        let buckets = bucket_days(&days, &[&values[..]], &[0.0; 4], 0.25);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day_number, 9.0);
        assert_eq!(buckets[0].max, vec![2.0]);
        // 10.25 sits exactly on the boundary and opens the next bucket.
        assert_eq!(buckets[1].day_number, 10.0);
        assert_eq!(buckets[1].min, vec![3.0]);
        assert_eq!(buckets[1].max, vec![4.0]);
    }

    #[test]
    fn test_skipped_days_produce_no_bucket() {
        let days = [1.1, 1.9, 7.4];
        let values = [1.0, 2.0, 3.0];
        let buckets = bucket_days(&days, &[&values[..]], &[0.0; 3], 0.0);

        let floors: Vec<f64> = buckets.iter().map(|b| b.day_number).collect();
        assert_eq!(floors, vec![1.0, 7.0]);
    }

    #[test]
    fn test_ties_keep_first_seen_value() {
        let days = [1.1, 1.2];
        let values = [-0.0, 0.0];
        let buckets = bucket_days(&days, &[&values[..]], &[0.0; 2], 0.0);
        assert!(buckets[0].max[0].is_sign_negative());
        assert!(buckets[0].min[0].is_sign_negative());
    }

    #[test]
    fn test_missing_values_never_win() {
        let days = [1.1, 1.2, 1.3, 1.4];
        let partly_missing = [f64::NAN, 5.0, f64::NAN, 3.0];
        let reserved = [f64::NAN; 4];
        let buckets = bucket_days(&days, &[&partly_missing[..], &reserved[..]], &[0.0; 4], 0.0);

        assert_eq!(buckets[0].max[0], 5.0);
        assert_eq!(buckets[0].min[0], 3.0);
        assert!(buckets[0].max[1].is_nan());
        assert!(buckets[0].min[1].is_nan());
    }
}
