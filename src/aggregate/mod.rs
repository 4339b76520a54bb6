//! The daily aggregator: turns the raw observation store into per-day summaries and
//! appends the whole-series day-number and cumulative rainfall columns.

pub(crate) mod accumulator;
pub mod error;

use crate::aggregate::accumulator::bucket_days;
use crate::aggregate::error::AggregateError;
use crate::day_number;
use crate::schema::{CUMULATIVE_RAIN_FIELD, DAY_NUMBER_FIELD, NO_UNIT, RAINFALL_FIELD, RAIN_UNIT};
use crate::store::daily_store::DailySeriesStore;
use crate::store::error::StoreError;
use crate::store::raw_store::RawSeriesStore;
use bon::bon;
use log::debug;
use std::time::Instant;

/// Default day-boundary offset: the local day starts at 06 UTC (00 CST / 01 CDT).
pub const DEFAULT_DAY_OFFSET: f64 = 0.25;

/// Result of one aggregation run.
#[derive(Debug, Clone)]
pub struct Aggregated {
    /// One entry per day bucket.
    pub daily: DailySeriesStore,
    /// The input store with `ADdays` and `CumulativeRain` appended.
    pub raw: RawSeriesStore,
}

/// Configured daily aggregator.
///
/// Aggregation is a pure function of the input store; one `Aggregator` can be reused
/// for any number of stores.
///
/// # Examples
///
/// ```
/// use wxarchive::{Aggregator, RawSeriesStore, UnitRegistry};
///
/// let units: UnitRegistry = [("Epochtime", "seconds"), ("Rainfall", "inches")]
///     .into_iter()
///     .collect();
/// let raw = RawSeriesStore::from_columns(
///     vec![
///         ("Epochtime".to_string(), vec![0.0, 3_600.0, 90_000.0]),
///         ("Rainfall".to_string(), vec![0.0, 0.02, 0.01]),
///     ],
///     &units,
/// )?;
///
/// let aggregated = Aggregator::builder().day_offset(0.0).build()?.aggregate(&raw)?;
/// assert_eq!(aggregated.daily.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregator {
    day_offset: f64,
    rainfall_field: String,
}

#[bon]
impl Aggregator {
    /// Creates an aggregator.
    ///
    /// * `.day_offset(f64)`: fraction of a day past UTC midnight at which a day starts.
    ///   Defaults to [`DEFAULT_DAY_OFFSET`].
    /// * `.rainfall_field(&str)`: field summed into daily and cumulative totals.
    ///   Defaults to `Rainfall`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidOffset`] if the offset is not within `[0, 1)`.
    #[builder]
    pub fn new(
        day_offset: Option<f64>,
        rainfall_field: Option<&str>,
    ) -> Result<Self, AggregateError> {
        let day_offset = day_offset.unwrap_or(DEFAULT_DAY_OFFSET);
        if !(0.0..1.0).contains(&day_offset) {
            return Err(AggregateError::InvalidOffset(day_offset));
        }
        Ok(Self {
            day_offset,
            rainfall_field: rainfall_field.unwrap_or(RAINFALL_FIELD).to_string(),
        })
    }

    pub fn day_offset(&self) -> f64 {
        self.day_offset
    }

    /// Buckets `raw` into days and derives the whole-series columns.
    ///
    /// # Errors
    ///
    /// * [`AggregateError::Store`] wrapping [`StoreError::EmptyInput`] for an empty store.
    /// * [`AggregateError::MissingRainfallField`] if the rainfall field is absent.
    /// * [`AggregateError::InvalidTimestamp`] / [`AggregateError::UnsortedInput`] if the
    ///   timestamps are not finite and non-decreasing.
    pub fn aggregate(&self, raw: &RawSeriesStore) -> Result<Aggregated, AggregateError> {
        if raw.is_empty() {
            return Err(StoreError::EmptyInput.into());
        }
        if !raw.contains(&self.rainfall_field) {
            return Err(AggregateError::MissingRainfallField(
                self.rainfall_field.clone(),
            ));
        }

        let timestamps = raw.timestamps()?;
        check_time_order(&timestamps)?;

        let day_numbers: Vec<f64> = timestamps.iter().map(|&t| day_number::from_epoch(t)).collect();
        let rainfall: Vec<f64> = raw
            .series(&self.rainfall_field)?
            .iter()
            .map(|&r| if r.is_nan() { 0.0 } else { r })
            .collect();
        let fields = raw
            .field_names()
            .map(|name| raw.series(name))
            .collect::<Result<Vec<_>, _>>()?;
        let columns: Vec<&[f64]> = fields.iter().map(|c| c.as_ref()).collect();

        let started = Instant::now();
        let buckets = bucket_days(&day_numbers, &columns, &rainfall, self.day_offset);
        debug!(
            "Bucketed {} observations into {} days in {:?}",
            raw.len(),
            buckets.len(),
            started.elapsed()
        );

        let daily = DailySeriesStore::from_buckets(raw.units(), &buckets)?;
        let cumulative = cumulative_sum(&rainfall);
        let raw = raw.with_columns(vec![
            (DAY_NUMBER_FIELD, NO_UNIT, day_numbers),
            (CUMULATIVE_RAIN_FIELD, RAIN_UNIT, cumulative),
        ])?;

        Ok(Aggregated { daily, raw })
    }
}

/// Aggregates `raw` with the given day offset and the default rainfall field.
pub fn aggregate(raw: &RawSeriesStore, day_offset: f64) -> Result<Aggregated, AggregateError> {
    Aggregator::builder()
        .day_offset(day_offset)
        .build()?
        .aggregate(raw)
}

fn check_time_order(timestamps: &[f64]) -> Result<(), AggregateError> {
    if let Some(index) = timestamps.iter().position(|t| !t.is_finite()) {
        return Err(AggregateError::InvalidTimestamp { index });
    }
    match timestamps.windows(2).position(|pair| pair[1] < pair[0]) {
        Some(index) => Err(AggregateError::UnsortedInput {
            index: index + 1,
            previous: timestamps[index],
            timestamp: timestamps[index + 1],
        }),
        None => Ok(()),
    }
}

fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |total, value| {
            *total += value;
            Some(*total)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UnitRegistry;

    // 2017-07-04T00:00:00Z
    const JULY_4: f64 = 1_499_126_400.0;
    const HOUR: f64 = 3_600.0;

    fn units() -> UnitRegistry {
        [
            ("Epochtime", "seconds"),
            ("OutTemp", "°F"),
            ("Rainfall", "inches"),
            ("Empty1", "None"),
        ]
        .into_iter()
        .collect()
    }

    fn store(rows: &[(f64, f64, f64)]) -> RawSeriesStore {
        RawSeriesStore::from_columns(
            vec![
                ("Epochtime".to_string(), rows.iter().map(|r| r.0).collect()),
                ("OutTemp".to_string(), rows.iter().map(|r| r.1).collect()),
                ("Rainfall".to_string(), rows.iter().map(|r| r.2).collect()),
                ("Empty1".to_string(), vec![f64::NAN; rows.len()]),
            ],
            &units(),
        )
        .unwrap()
    }

    fn week_of_july() -> RawSeriesStore {
        store(&[
            (JULY_4 + 3.0 * HOUR, 60.0, 0.0),
            (JULY_4 + 12.0 * HOUR, 85.0, 0.1),
            (JULY_4 + 29.0 * HOUR, 58.0, 0.02),
            // 06 UTC on the 5th: exactly on the boundary with the default offset.
            (JULY_4 + 30.0 * HOUR, 62.0, 0.0),
            (JULY_4 + 39.0 * HOUR, 90.0, 0.3),
            // The 6th has no observations at all.
            (JULY_4 + 82.0 * HOUR, 70.0, 0.05),
        ])
    }

    fn aggregate_default(raw: &RawSeriesStore) -> Aggregated {
        Aggregator::builder().build().unwrap().aggregate(raw).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_offset_buckets() {
        let aggregated = aggregate_default(&week_of_july());
        let daily = &aggregated.daily;

        let july_4 = day_number::from_epoch(JULY_4);
        assert_eq!(daily.day_numbers(), &[july_4, july_4 + 1.0, july_4 + 3.0]);
        assert_eq!(daily.lookup("MaxOutTemp"), Some(&[85.0, 90.0, 70.0][..]));
        assert_eq!(daily.lookup("MinOutTemp"), Some(&[58.0, 62.0, 70.0][..]));
        assert!(close(daily.rain_totals()[0], 0.12));
        assert!(close(daily.rain_totals()[1], 0.3));
        assert!(close(daily.rain_totals()[2], 0.05));
        assert_eq!(daily.representative_timestamps()[0], JULY_4 + 3.0 * HOUR);
        assert_eq!(daily.closing_timestamps()[0], JULY_4 + 29.0 * HOUR);
    }

    #[test]
    fn test_reserved_fields_round_trip_as_nan() {
        let aggregated = aggregate_default(&week_of_july());
        let empty_max = aggregated.daily.lookup("MaxEmpty1").unwrap();
        assert_eq!(empty_max.len(), 3);
        assert!(empty_max.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_augmented_columns() {
        let input = week_of_july();
        let aggregated = aggregate_default(&input);
        let raw = &aggregated.raw;

        assert_eq!(raw.len(), input.len());
        assert_eq!(raw.unit_of("ADdays"), Some("None"));
        assert_eq!(raw.unit_of("CumulativeRain"), Some("inches"));

        let days = raw.series("ADdays").unwrap();
        assert_eq!(days[0], day_number::from_epoch(JULY_4 + 3.0 * HOUR));
        assert!(days.windows(2).all(|w| w[0] <= w[1]));

        let cumulative = raw.series("CumulativeRain").unwrap();
        assert!(cumulative.windows(2).all(|w| w[0] <= w[1]));
        assert!(close(*cumulative.last().unwrap(), 0.47));
        // The input store is not modified.
        assert!(!input.contains("ADdays"));
    }

    #[test]
    fn test_zero_offset_splits_at_midnight() {
        let aggregated = aggregate(&week_of_july(), 0.0).unwrap();
        // Midnight-aligned days: the 4th, the 5th (from 05 UTC on) and the 7th.
        assert_eq!(aggregated.daily.len(), 3);
        assert_eq!(aggregated.daily.lookup("MaxOutTemp"), Some(&[85.0, 90.0, 70.0][..]));
        assert_eq!(aggregated.daily.lookup("MinOutTemp"), Some(&[60.0, 58.0, 70.0][..]));
    }

    #[test]
    fn test_single_observation() {
        let aggregated = aggregate(&store(&[(JULY_4, 72.5, 0.03)]), 0.25).unwrap();
        assert_eq!(aggregated.daily.len(), 1);
        assert_eq!(aggregated.daily.lookup("MaxOutTemp"), Some(&[72.5][..]));
        assert_eq!(aggregated.daily.lookup("MinOutTemp"), Some(&[72.5][..]));
        assert_eq!(
            aggregated.raw.series("CumulativeRain").unwrap().as_ref(),
            &[0.03]
        );
    }

    #[test]
    fn test_missing_rainfall_counts_as_zero() {
        let aggregated =
            aggregate(&store(&[(JULY_4, 70.0, f64::NAN), (JULY_4 + HOUR, 71.0, 0.2)]), 0.25)
                .unwrap();
        assert_eq!(aggregated.daily.rain_totals(), &[0.2]);
        assert_eq!(
            aggregated.raw.series("CumulativeRain").unwrap().as_ref(),
            &[0.0, 0.2]
        );
    }

    #[test]
    fn test_invalid_offsets_are_rejected() {
        for offset in [-0.1, 1.0, 2.5, f64::NAN, f64::INFINITY] {
            let result = Aggregator::builder().day_offset(offset).build();
            assert!(
                matches!(result, Err(AggregateError::InvalidOffset(_))),
                "offset {offset} should be rejected"
            );
        }
        assert!(Aggregator::builder().day_offset(0.0).build().is_ok());
        assert!(Aggregator::builder().day_offset(0.999).build().is_ok());
    }

    #[test]
    fn test_unsorted_input_is_rejected() {
        let result = aggregate(
            &store(&[(JULY_4, 70.0, 0.0), (JULY_4 - HOUR, 71.0, 0.0)]),
            0.25,
        );
        match result {
            Err(AggregateError::UnsortedInput {
                index,
                previous,
                timestamp,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(previous, JULY_4);
                assert_eq!(timestamp, JULY_4 - HOUR);
            }
            other => panic!("expected UnsortedInput, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_timestamp_is_rejected() {
        let result = aggregate(&store(&[(JULY_4, 70.0, 0.0), (f64::NAN, 71.0, 0.0)]), 0.25);
        assert!(matches!(
            result,
            Err(AggregateError::InvalidTimestamp { index: 1 })
        ));
    }

    #[test]
    fn test_custom_rainfall_field_must_exist() {
        let aggregator = Aggregator::builder()
            .rainfall_field("RainRate")
            .build()
            .unwrap();
        let result = aggregator.aggregate(&week_of_july());
        assert!(matches!(result, Err(AggregateError::MissingRainfallField(f)) if f == "RainRate"));
    }

    /// Brute-force check of the bucket invariants over a pseudo-random irregular series.
    #[test]
    fn test_bucket_invariants_hold_for_irregular_series() {
        let mut seed: u64 = 0x5eed;
        let mut next = || {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (seed >> 33) as f64 / (1u64 << 31) as f64
        };

        let mut rows = Vec::new();
        let mut t = JULY_4;
        for _ in 0..2_000 {
            // Mostly 5-minute steps with occasional multi-day gaps.
            t += if next() < 0.01 { next() * 4.0 * 86_400.0 } else { 300.0 };
            rows.push((t, 40.0 + 60.0 * next(), (next() * 10.0).floor() / 100.0));
        }
        let input = store(&rows);
        let offset = 0.25;
        let aggregated = aggregate(&input, offset).unwrap();
        let daily = &aggregated.daily;

        // Recompute bucket membership independently.
        let days: Vec<f64> = rows.iter().map(|r| day_number::from_epoch(r.0)).collect();
        let mut membership = Vec::with_capacity(rows.len());
        let mut floor = days[0].floor();
        let mut bucket = 0usize;
        for &day in &days {
            if day >= floor + 1.0 + offset {
                floor = day.floor();
                bucket += 1;
            }
            membership.push(bucket);
        }
        let bucket_count = bucket + 1;

        assert_eq!(daily.len(), bucket_count);
        assert_eq!(daily.rain_totals().len(), bucket_count);
        assert_eq!(daily.lookup("MaxOutTemp").unwrap().len(), bucket_count);

        for b in 0..bucket_count {
            let temps: Vec<f64> = rows
                .iter()
                .zip(&membership)
                .filter(|(_, m)| **m == b)
                .map(|(r, _)| r.1)
                .collect();
            let max = temps.iter().copied().fold(f64::MIN, f64::max);
            let min = temps.iter().copied().fold(f64::MAX, f64::min);
            assert_eq!(daily.lookup("MaxOutTemp").unwrap()[b], max);
            assert_eq!(daily.lookup("MinOutTemp").unwrap()[b], min);
        }

        let total_rain: f64 = rows.iter().map(|r| r.2).sum();
        let bucket_rain: f64 = daily.rain_totals().iter().sum();
        assert!(close(total_rain, bucket_rain));

        let cumulative = aggregated.raw.series("CumulativeRain").unwrap();
        assert_eq!(cumulative.len(), rows.len());
        assert!(close(*cumulative.last().unwrap(), total_rain));
        assert!(cumulative.windows(2).all(|w| w[0] <= w[1]));
    }
}
