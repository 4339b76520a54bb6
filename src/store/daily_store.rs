//! Contains the `DailySeriesStore` produced by the daily aggregator, and the
//! structured names used to address its columns.

use crate::day_number;
use crate::schema::{UnitRegistry, DAILY_DATE_FIELD, DAILY_RAIN_FIELD, NO_UNIT, RAIN_UNIT};
use crate::store::error::StoreError;
use polars::prelude::{Column, CsvWriter, DataFrame, DataType, SerWriter};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Which per-day reduction a daily column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationKind {
    Max,
    Min,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 2] = [AggregationKind::Max, AggregationKind::Min];

    fn prefix(self) -> &'static str {
        match self {
            AggregationKind::Max => "Max",
            AggregationKind::Min => "Min",
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Address of one column of the daily store.
///
/// The display form (`MaxOutTemp`, `ADDailyDate`, `Rain4Day`) is what users type;
/// [`DailyVariable::parse`] turns it back into the structured form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DailyVariable {
    Extreme { kind: AggregationKind, field: String },
    DayNumber,
    RainTotal,
}

impl DailyVariable {
    pub fn extreme(kind: AggregationKind, field: impl Into<String>) -> Self {
        DailyVariable::Extreme {
            kind,
            field: field.into(),
        }
    }

    /// Parses a display name. This is purely syntactic: whether the field exists is
    /// decided by the store.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            DAILY_DATE_FIELD => Some(DailyVariable::DayNumber),
            DAILY_RAIN_FIELD => Some(DailyVariable::RainTotal),
            _ => AggregationKind::ALL.into_iter().find_map(|kind| {
                name.strip_prefix(kind.prefix())
                    .filter(|field| !field.is_empty())
                    .map(|field| DailyVariable::extreme(kind, field))
            }),
        }
    }
}

impl fmt::Display for DailyVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DailyVariable::Extreme { kind, field } => write!(f, "{kind}{field}"),
            DailyVariable::DayNumber => f.write_str(DAILY_DATE_FIELD),
            DailyVariable::RainTotal => f.write_str(DAILY_RAIN_FIELD),
        }
    }
}

/// A closed day bucket: the day-number floor it was opened with, its rainfall total
/// and the per-field extremes in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub day_number: f64,
    pub rain_total: f64,
    pub max: Vec<f64>,
    pub min: Vec<f64>,
}

/// Daily maxima and minima of one raw field, one value per bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExtremes {
    pub field: String,
    pub max: Vec<f64>,
    pub min: Vec<f64>,
}

impl FieldExtremes {
    pub fn get(&self, kind: AggregationKind) -> &[f64] {
        match kind {
            AggregationKind::Max => &self.max,
            AggregationKind::Min => &self.min,
        }
    }
}

/// Per-day summary columns, all index-aligned with one entry per day bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeriesStore {
    day_numbers: Vec<f64>,
    rain_totals: Vec<f64>,
    extremes: Vec<FieldExtremes>,
    field_units: UnitRegistry,
}

impl DailySeriesStore {
    /// Transposes closed buckets into columns.
    ///
    /// `field_units` lists the raw fields in the order their extremes appear in each
    /// bucket; the first one is the timestamp field.
    pub fn from_buckets(
        field_units: &UnitRegistry,
        buckets: &[DayBucket],
    ) -> Result<Self, StoreError> {
        if buckets.is_empty() {
            return Err(StoreError::EmptyInput);
        }
        let mut extremes: Vec<FieldExtremes> = field_units
            .names()
            .map(|field| FieldExtremes {
                field: field.to_string(),
                max: Vec::with_capacity(buckets.len()),
                min: Vec::with_capacity(buckets.len()),
            })
            .collect();

        for bucket in buckets {
            for (values, name) in [(&bucket.max, "max"), (&bucket.min, "min")] {
                if values.len() != extremes.len() {
                    return Err(StoreError::LengthMismatch {
                        field: format!("bucket {} {}", bucket.day_number, name),
                        expected: extremes.len(),
                        found: values.len(),
                    });
                }
            }
            for (column, (max, min)) in extremes
                .iter_mut()
                .zip(bucket.max.iter().zip(bucket.min.iter()))
            {
                column.max.push(*max);
                column.min.push(*min);
            }
        }

        Ok(Self {
            day_numbers: buckets.iter().map(|b| b.day_number).collect(),
            rain_totals: buckets.iter().map(|b| b.rain_total).collect(),
            extremes,
            field_units: field_units.clone(),
        })
    }

    /// Number of day buckets.
    pub fn len(&self) -> usize {
        self.day_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day_numbers.is_empty()
    }

    /// Day-number floor of every bucket (`ADDailyDate`).
    pub fn day_numbers(&self) -> &[f64] {
        &self.day_numbers
    }

    /// Rainfall total of every bucket (`Rain4Day`).
    pub fn rain_totals(&self) -> &[f64] {
        &self.rain_totals
    }

    pub fn extremes(&self, field: &str) -> Option<&FieldExtremes> {
        self.extremes.iter().find(|e| e.field == field)
    }

    pub fn all_extremes(&self) -> &[FieldExtremes] {
        &self.extremes
    }

    /// The raw timestamp field whose daily minimum represents each bucket in time.
    pub fn timestamp_field(&self) -> &str {
        self.extremes
            .first()
            .map(|e| e.field.as_str())
            .unwrap_or_default()
    }

    /// Earliest observation time of every bucket (`MinEpochtime`).
    pub fn representative_timestamps(&self) -> &[f64] {
        self.extremes
            .first()
            .map(|e| e.min.as_slice())
            .unwrap_or_default()
    }

    /// Latest observation time of every bucket (`MaxEpochtime`).
    pub fn closing_timestamps(&self) -> &[f64] {
        self.extremes
            .first()
            .map(|e| e.max.as_slice())
            .unwrap_or_default()
    }

    pub fn get(&self, variable: &DailyVariable) -> Option<&[f64]> {
        match variable {
            DailyVariable::Extreme { kind, field } => {
                self.extremes(field).map(|extremes| extremes.get(*kind))
            }
            DailyVariable::DayNumber => Some(&self.day_numbers),
            DailyVariable::RainTotal => Some(&self.rain_totals),
        }
    }

    /// Looks up a column by its display name.
    pub fn lookup(&self, name: &str) -> Option<&[f64]> {
        DailyVariable::parse(name).and_then(|variable| self.get(&variable))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Unit of a daily column; extremes inherit the unit of their raw field.
    pub fn unit_of(&self, name: &str) -> Option<&str> {
        match DailyVariable::parse(name)? {
            DailyVariable::Extreme { field, .. } => self.field_units.unit_of(&field),
            DailyVariable::DayNumber => Some(NO_UNIT),
            DailyVariable::RainTotal => Some(RAIN_UNIT),
        }
    }

    /// Every daily column with its unit: `Max`/`Min` pairs per field in field order,
    /// then `ADDailyDate` and `Rain4Day`.
    pub fn variables(&self) -> UnitRegistry {
        let mut registry = UnitRegistry::new();
        for (field, unit) in self.field_units.iter() {
            for kind in AggregationKind::ALL {
                registry.insert(DailyVariable::extreme(kind, field).to_string(), unit);
            }
        }
        registry.insert(DAILY_DATE_FIELD, NO_UNIT);
        registry.insert(DAILY_RAIN_FIELD, RAIN_UNIT);
        registry
    }

    /// Builds a polars frame with `ADDailyDate`, a calendar `date`, `Rain4Day` and
    /// the `Max`/`Min` column of every field.
    pub fn to_frame(&self) -> Result<DataFrame, StoreError> {
        let dates: Vec<Option<i32>> = self
            .day_numbers
            .iter()
            .map(|&day| {
                day_number::to_date(day).map(|date| {
                    (day_number::from_date(date) - day_number::UNIX_EPOCH_DAY_NUMBER) as i32
                })
            })
            .collect();
        let date_column = Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(StoreError::FrameConstruction)?;

        let mut columns = vec![
            Column::new(DAILY_DATE_FIELD.into(), self.day_numbers.clone()),
            date_column,
            Column::new(DAILY_RAIN_FIELD.into(), self.rain_totals.clone()),
        ];
        for extremes in &self.extremes {
            for kind in AggregationKind::ALL {
                let name = DailyVariable::extreme(kind, extremes.field.as_str()).to_string();
                columns.push(Column::new(name.into(), extremes.get(kind).to_vec()));
            }
        }
        DataFrame::new(columns).map_err(StoreError::FrameConstruction)
    }

    /// Writes [`DailySeriesStore::to_frame`] to `path` as CSV with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<(), StoreError> {
        let mut frame = self.to_frame()?;
        let mut file =
            File::create(path).map_err(|e| StoreError::ExportIo(path.to_path_buf(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)
            .map_err(|e| StoreError::ExportPolars(path.to_path_buf(), e))?;
        log::info!("Wrote {} daily rows to {:?}", frame.height(), path);
        Ok(())
    }
}
