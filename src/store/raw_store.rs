//! Contains the `RawSeriesStore`, the columnar in-memory form of the archive rows.

use crate::schema::UnitRegistry;
use crate::store::error::StoreError;
use polars::prelude::{Column, DataFrame};
use std::borrow::Cow;

/// One named `f64` column per archive field, index-aligned and in input order.
///
/// The first column is always the epoch timestamp. Every column has the same length
/// (the observation count) and the store never holds zero observations.
///
/// The store is immutable: deriving new columns produces a new store via
/// [`RawSeriesStore::with_columns`], leaving the original untouched. Cloning is cheap
/// because the underlying polars columns are reference counted.
#[derive(Debug, Clone)]
pub struct RawSeriesStore {
    frame: DataFrame,
    units: UnitRegistry,
}

impl RawSeriesStore {
    /// Builds a store from `(field name, values)` pairs, in column order.
    ///
    /// `units` must contain an entry for every field; it may hold more, in which case
    /// only the fields that are present are carried into the store's own registry.
    ///
    /// # Errors
    ///
    /// * [`StoreError::EmptyInput`] if there are no columns or no observations.
    /// * [`StoreError::LengthMismatch`] if a column's length differs from the first one.
    /// * [`StoreError::MissingUnit`] / [`StoreError::DuplicateField`] for registry problems.
    pub fn from_columns(
        columns: Vec<(String, Vec<f64>)>,
        units: &UnitRegistry,
    ) -> Result<Self, StoreError> {
        let expected = columns.first().map_or(0, |(_, values)| values.len());
        if expected == 0 {
            return Err(StoreError::EmptyInput);
        }

        let mut store_units = UnitRegistry::new();
        let mut frame_columns = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            if values.len() != expected {
                return Err(StoreError::LengthMismatch {
                    field: name,
                    expected,
                    found: values.len(),
                });
            }
            if store_units.contains(&name) {
                return Err(StoreError::DuplicateField(name));
            }
            let unit = units
                .unit_of(&name)
                .ok_or_else(|| StoreError::MissingUnit(name.clone()))?;
            store_units.insert(name.as_str(), unit);
            frame_columns.push(Column::new(name.into(), values));
        }

        let frame = DataFrame::new(frame_columns).map_err(StoreError::FrameConstruction)?;
        Ok(Self {
            frame,
            units: store_units,
        })
    }

    /// Returns a new store with `columns` appended as `(name, unit, values)`.
    pub fn with_columns(&self, columns: Vec<(&str, &str, Vec<f64>)>) -> Result<Self, StoreError> {
        let mut frame = self.frame.clone();
        let mut units = self.units.clone();
        for (name, unit, values) in columns {
            if values.len() != self.len() {
                return Err(StoreError::LengthMismatch {
                    field: name.to_string(),
                    expected: self.len(),
                    found: values.len(),
                });
            }
            if units.contains(name) {
                return Err(StoreError::DuplicateField(name.to_string()));
            }
            frame
                .with_column(Column::new(name.into(), values))
                .map_err(StoreError::FrameConstruction)?;
            units.insert(name, unit);
        }
        Ok(Self { frame, units })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Always `false`; construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// The epoch timestamp field, which is always the first column.
    pub fn timestamp_field(&self) -> &str {
        self.units.names().next().unwrap_or_default()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.units.names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains(name)
    }

    pub fn unit_of(&self, name: &str) -> Option<&str> {
        self.units.unit_of(name)
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Every field with its unit, in column order; derived columns come last.
    pub fn variables(&self) -> UnitRegistry {
        self.units.clone()
    }

    /// Read-only view of the backing frame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Values of one field, borrowed when the column is a single contiguous chunk.
    /// Nulls, if any, read as `NaN`.
    pub fn series(&self, name: &str) -> Result<Cow<'_, [f64]>, StoreError> {
        let values = self
            .frame
            .column(name)
            .map_err(|e| StoreError::ColumnNotFound(name.to_string(), e))?
            .f64()
            .map_err(|e| StoreError::ColumnType(name.to_string(), e))?;
        Ok(match values.cont_slice() {
            Ok(slice) => Cow::Borrowed(slice),
            Err(_) => Cow::Owned(
                values
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect(),
            ),
        })
    }

    pub fn timestamps(&self) -> Result<Cow<'_, [f64]>, StoreError> {
        self.series(self.timestamp_field())
    }
}
