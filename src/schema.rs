//! Defines the fixed column layout of a weather station `archive` table and the
//! display units carried alongside every field.

use std::fmt;

/// Name of the epoch timestamp field. It is always the first archive column.
pub const TIMESTAMP_FIELD: &str = "Epochtime";
/// Name of the per-interval rainfall field (inches).
pub const RAINFALL_FIELD: &str = "Rainfall";
/// Continuous day-number column appended to the raw store.
pub const DAY_NUMBER_FIELD: &str = "ADdays";
/// Running rainfall total column appended to the raw store.
pub const CUMULATIVE_RAIN_FIELD: &str = "CumulativeRain";
/// Day-number of each daily bucket.
pub const DAILY_DATE_FIELD: &str = "ADDailyDate";
/// Rainfall total of each daily bucket.
pub const DAILY_RAIN_FIELD: &str = "Rain4Day";

/// Unit label used for dimensionless or placeholder columns.
pub const NO_UNIT: &str = "None";
pub const RAIN_UNIT: &str = "inches";

/// The positional `(name, unit)` layout of the `archive` table.
///
/// `Unknown*` columns carry data whose meaning has not been identified, `Empty*`
/// columns are always NULL. Both are kept so the positions of the real columns line up.
pub const ARCHIVE_FIELDS: [(&str, &str); 52] = [
    (TIMESTAMP_FIELD, "seconds"),
    ("USUnits", NO_UNIT),
    ("SampleInterval", "Minutes"),
    ("Barometer", "in. Hg."),
    ("Pressure", "in. Hg."),
    ("Altimeter", "in. Hg."),
    ("InTemp", "°F"),
    ("OutTemp", "°F"),
    ("InHumidity", "%"),
    ("OutHumidity", "%"),
    ("WindSpeed", "mph"),
    ("WindDir", "degrees"),
    ("WindGust", "mph"),
    ("WindGustDir", "degrees"),
    ("RainRate", "in./hr."),
    (RAINFALL_FIELD, RAIN_UNIT),
    ("Dewpoint", "°F"),
    ("WindChill", "°F"),
    ("HeatIndex", "°F"),
    ("Unknown1", "Unknown"),
    ("Empty1", NO_UNIT),
    ("Empty2", NO_UNIT),
    ("Empty3", NO_UNIT),
    ("Empty4", NO_UNIT),
    ("Empty5", NO_UNIT),
    ("Empty6", NO_UNIT),
    ("Empty7", NO_UNIT),
    ("Empty8", NO_UNIT),
    ("Empty9", NO_UNIT),
    ("Empty10", NO_UNIT),
    ("Empty11", NO_UNIT),
    ("Empty12", NO_UNIT),
    ("Empty13", NO_UNIT),
    ("Empty14", NO_UNIT),
    ("Empty15", NO_UNIT),
    ("Empty16", NO_UNIT),
    ("Empty17", NO_UNIT),
    ("Empty18", NO_UNIT),
    ("Empty19", NO_UNIT),
    ("SignalQuality", "%"),
    ("Unknown2", "Unknown"),
    ("Unknown3", "Unknown"),
    ("Empty20", NO_UNIT),
    ("Empty21", NO_UNIT),
    ("Empty22", NO_UNIT),
    ("Empty23", NO_UNIT),
    ("Empty24", NO_UNIT),
    ("Empty25", NO_UNIT),
    ("Empty26", NO_UNIT),
    ("Empty27", NO_UNIT),
    ("Empty28", NO_UNIT),
    ("Empty29", NO_UNIT),
];

/// Ordered mapping from a variable name to its display unit.
///
/// Insertion order is preserved so listings follow the column order of the store
/// the registry belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitRegistry {
    entries: Vec<(String, String)>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for the full `archive` layout, in column order.
    pub fn archive() -> Self {
        ARCHIVE_FIELDS.iter().copied().collect()
    }

    /// Adds a variable, or replaces its unit if the name is already registered.
    pub fn insert(&mut self, name: impl Into<String>, unit: impl Into<String>) {
        let name = name.into();
        let unit = unit.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = unit,
            None => self.entries.push((name, unit)),
        }
    }

    pub fn unit_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, unit)| unit.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.unit_of(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, unit)| (name.as_str(), unit.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, U: Into<String>> FromIterator<(N, U)> for UnitRegistry {
    fn from_iter<I: IntoIterator<Item = (N, U)>>(iter: I) -> Self {
        let mut registry = UnitRegistry::new();
        for (name, unit) in iter {
            registry.insert(name, unit);
        }
        registry
    }
}

/// Formats the registry as one `name [unit]` entry per line.
impl fmt::Display for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, unit) in self.iter() {
            writeln!(f, "{name} [{unit}]")?;
        }
        Ok(())
    }
}
