use crate::error::{MeasureError, Result};
use serde::{Deserialize, Serialize};

/// Returned when no configured range matches
pub const UNKNOWN: &str = "unknown";

/// Named width band, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRange {
    pub name: String,
    pub min_mm: f64,
    pub max_mm: f64,
}

impl CategoryRange {
    pub fn new(name: impl Into<String>, min_mm: f64, max_mm: f64) -> Self {
        Self {
            name: name.into(),
            min_mm,
            max_mm,
        }
    }

    pub fn contains(&self, width_mm: f64) -> bool {
        self.min_mm <= width_mm && width_mm <= self.max_mm
    }
}

/// Ordered width bands; the first match wins.
///
/// Pipe standards differ between installations, so the table is plain
/// configuration and is looked up by width alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    ranges: Vec<CategoryRange>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(vec![
            CategoryRange::new("small", 200.0, 400.0),
            CategoryRange::new("medium", 401.0, 700.0),
            CategoryRange::new("large", 701.0, 1500.0),
        ])
    }
}

impl CategoryTable {
    pub fn new(ranges: Vec<CategoryRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[CategoryRange] {
        &self.ranges
    }

    pub fn categorize(&self, width_mm: f64) -> &str {
        self.ranges
            .iter()
            .find(|r| r.contains(width_mm))
            .map(|r| r.name.as_str())
            .unwrap_or(UNKNOWN)
    }

    /// Bounds must be ordered and bands must not overlap
    pub fn validate(&self) -> Result<()> {
        for r in &self.ranges {
            if !(r.min_mm <= r.max_mm) {
                return Err(MeasureError::InvalidConfig(format!(
                    "category '{}' has min {} above max {}",
                    r.name, r.min_mm, r.max_mm
                )));
            }
        }
        for (i, a) in self.ranges.iter().enumerate() {
            for b in &self.ranges[i + 1..] {
                if a.min_mm <= b.max_mm && b.min_mm <= a.max_mm {
                    return Err(MeasureError::InvalidConfig(format!(
                        "categories '{}' and '{}' overlap",
                        a.name, b.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_bounds_are_inclusive() {
        let table = CategoryTable::default();

        assert_eq!(table.categorize(200.0), "small");
        assert_eq!(table.categorize(400.0), "small");
        assert_eq!(table.categorize(401.0), "medium");
        assert_eq!(table.categorize(700.0), "medium");
        assert_eq!(table.categorize(1500.0), "large");
    }

    #[test]
    fn gaps_and_out_of_range_are_unknown() {
        let table = CategoryTable::default();

        assert_eq!(table.categorize(0.0), UNKNOWN);
        assert_eq!(table.categorize(199.9), UNKNOWN);
        assert_eq!(table.categorize(400.5), UNKNOWN);
        assert_eq!(table.categorize(1500.1), UNKNOWN);
    }

    #[test]
    fn every_width_gets_exactly_one_name() {
        let table = CategoryTable::default();
        let mut width = 0.0;
        while width <= 2000.0 {
            let name = table.categorize(width);
            let matching = table.ranges().iter().filter(|r| r.contains(width)).count();
            if matching == 0 {
                assert_eq!(name, UNKNOWN, "width {width}");
            } else {
                assert_eq!(matching, 1, "width {width}");
                assert_ne!(name, UNKNOWN, "width {width}");
            }
            width += 0.5;
        }
    }

    #[test]
    fn swapped_table_is_used() {
        let table = CategoryTable::new(vec![
            CategoryRange::new("dn100", 90.0, 120.0),
            CategoryRange::new("dn400", 380.0, 420.0),
        ]);

        assert_eq!(table.categorize(402.0), "dn400");
        assert_eq!(table.categorize(250.0), UNKNOWN);
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let table = CategoryTable::new(vec![
            CategoryRange::new("a", 0.0, 100.0),
            CategoryRange::new("b", 100.0, 200.0),
        ]);
        assert!(table.validate().is_err());
        assert!(CategoryTable::default().validate().is_ok());
    }
}
