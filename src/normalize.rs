//! Record normalization.
//!
//! Turns a [`RawTable`] into canonical [`KpiRecord`]s. Cell-level problems are
//! absorbed here and only counted in the [`NormalizeReport`]:
//!
//! - metric cells that do not parse as a finite number become `None`;
//! - dimension cells that are absent, empty or whitespace-only become
//!   [`UNKNOWN`].
//!
//! Structural problems are errors: a table without headers, or without one of
//! the metric columns, cannot produce a snapshot.

use log::{debug, warn};
use serde::Serialize;

use crate::{
    dimension::{DESCRIPTION_ALIASES, Dimension, Metric, UNKNOWN, find_header},
    error::{KpiError, Result},
    record::KpiRecord,
    source::{RawCell, RawTable},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub rows: usize,
    pub missing_target: usize,
    pub missing_output: usize,
    pub missing_achievement: usize,
    pub unknown_fills: usize,
    /// Cells the source could only decode with replacement characters.
    pub lossy_cells: usize,
}

impl NormalizeReport {
    fn count_missing(&mut self, metric: Metric) {
        match metric {
            Metric::Target => self.missing_target += 1,
            Metric::Output => self.missing_output += 1,
            Metric::AchievementPct => self.missing_achievement += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: Vec<KpiRecord>,
    pub report: NormalizeReport,
}

struct ColumnMap {
    metrics: Vec<(Metric, usize)>,
    dimensions: Vec<(Dimension, Option<usize>)>,
    description: Option<usize>,
}

impl ColumnMap {
    fn resolve(table: &RawTable) -> Result<Self> {
        if table.headers.is_empty() {
            return Err(KpiError::source_unavailable(&table.name, "table has no header row"));
        }
        let metrics = Metric::ALL
            .into_iter()
            .map(|metric| {
                find_header(&table.headers, metric.header_aliases())
                    .map(|idx| (metric, idx))
                    .ok_or_else(|| KpiError::MissingColumn {
                        source_name: table.name.clone(),
                        column: metric.header_aliases()[0].to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let dimensions = Dimension::ALL
            .into_iter()
            .map(|dimension| {
                let idx = find_header(&table.headers, dimension.header_aliases());
                if idx.is_none() {
                    warn!(
                        "Column for dimension '{}' not found in '{}'; every record will be '{}'",
                        dimension, table.name, UNKNOWN
                    );
                }
                (dimension, idx)
            })
            .collect();
        Ok(Self {
            metrics,
            dimensions,
            description: find_header(&table.headers, DESCRIPTION_ALIASES),
        })
    }
}

pub fn normalize(table: &RawTable) -> Result<Normalized> {
    let columns = ColumnMap::resolve(table)?;
    let mut report = NormalizeReport {
        rows: table.rows.len(),
        lossy_cells: table.lossy_cells,
        ..NormalizeReport::default()
    };

    let records = table
        .rows
        .iter()
        .map(|row| {
            let mut record = KpiRecord::default();
            for &(metric, idx) in &columns.metrics {
                let value = coerce_number(row.get(idx));
                if value.is_none() {
                    report.count_missing(metric);
                }
                *record.metric_mut(metric) = value;
            }
            for &(dimension, idx) in &columns.dimensions {
                match idx.and_then(|idx| coerce_category(row.get(idx))) {
                    Some(value) => *record.dimension_mut(dimension) = value,
                    None => report.unknown_fills += 1,
                }
            }
            if let Some(value) = columns
                .description
                .and_then(|idx| coerce_category(row.get(idx)))
            {
                record.description = value;
            }
            record
        })
        .collect::<Vec<_>>();

    debug!(
        "Normalized {} row(s) from '{}': {} missing target, {} missing output, {} missing achievement, {} unknown fill(s), {} lossy cell(s)",
        report.rows,
        table.name,
        report.missing_target,
        report.missing_output,
        report.missing_achievement,
        report.unknown_fills,
        report.lossy_cells
    );
    Ok(Normalized { records, report })
}

/// Finite number or `None`; text is trimmed before parsing.
pub fn coerce_number(cell: Option<&RawCell>) -> Option<f64> {
    let value = match cell? {
        RawCell::Empty => return None,
        RawCell::Number(number) => *number,
        RawCell::Text(text) => text.trim().parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Trimmed category text, or `None` when the cell carries nothing usable.
pub fn coerce_category(cell: Option<&RawCell>) -> Option<String> {
    match cell? {
        RawCell::Empty => None,
        RawCell::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        RawCell::Number(number) if number.is_finite() => Some(if number.fract() == 0.0 {
            format!("{number:.0}")
        } else {
            number.to_string()
        }),
        RawCell::Number(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_number_handles_text_numbers_and_garbage() {
        assert_eq!(coerce_number(Some(&RawCell::text(" 80.5 "))), Some(80.5));
        assert_eq!(coerce_number(Some(&RawCell::Number(0.0))), Some(0.0));
        assert_eq!(coerce_number(Some(&RawCell::text("n/a"))), None);
        assert_eq!(coerce_number(Some(&RawCell::text("80%"))), None);
        assert_eq!(coerce_number(Some(&RawCell::text("NaN"))), None);
        assert_eq!(coerce_number(Some(&RawCell::Number(f64::INFINITY))), None);
        assert_eq!(coerce_number(Some(&RawCell::Empty)), None);
        assert_eq!(coerce_number(None), None);
    }

    #[test]
    fn coerce_category_renders_integral_numbers_plainly() {
        assert_eq!(coerce_category(Some(&RawCell::Number(3.0))), Some("3".into()));
        assert_eq!(coerce_category(Some(&RawCell::Number(2.5))), Some("2.5".into()));
        assert_eq!(coerce_category(Some(&RawCell::text("   "))), None);
        assert_eq!(coerce_category(Some(&RawCell::text(" Q1 "))), Some("Q1".into()));
    }
}
