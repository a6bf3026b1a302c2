//! Group-level summary statistics over a filtered subset.
//!
//! Achievement statistics (count, mean, min, max) only see present values, so
//! a group without any achievement values reports `None` rather than zero.
//! Target and output sums treat missing values as zero.

use std::collections::HashMap;

use serde::Serialize;

use crate::{dimension::Dimension, record::KpiRecord};

/// Key used by [`overall`] for the whole-subset summary.
pub const OVERALL_KEY: &str = "All";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub total_target: f64,
    pub total_output: f64,
    pub record_count: usize,
}

struct GroupStats {
    key: String,
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    total_target: f64,
    total_output: f64,
    record_count: usize,
}

impl GroupStats {
    fn with_key(key: String) -> Self {
        Self {
            key,
            count: 0,
            sum: 0.0,
            min: None,
            max: None,
            total_target: 0.0,
            total_output: 0.0,
            record_count: 0,
        }
    }

    fn add_record(&mut self, record: &KpiRecord) {
        self.record_count += 1;
        self.total_target += record.target.unwrap_or(0.0);
        self.total_output += record.output.unwrap_or(0.0);
        if let Some(value) = record.achievement_pct {
            self.count += 1;
            self.sum += value;
            self.min = Some(self.min.map_or(value, |current| current.min(value)));
            self.max = Some(self.max.map_or(value, |current| current.max(value)));
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn into_row(self) -> AggregateRow {
        AggregateRow {
            mean: self.mean(),
            key: self.key,
            count: self.count,
            min: self.min,
            max: self.max,
            total_target: self.total_target,
            total_output: self.total_output,
            record_count: self.record_count,
        }
    }
}

/// Groups `records` by `group_by`, in order of first appearance.
pub fn aggregate<'a, I>(records: I, group_by: Dimension) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<GroupStats> = Vec::new();
    for record in records {
        let key = record.dimension(group_by);
        let idx = *positions.entry(key).or_insert_with(|| {
            groups.push(GroupStats::with_key(key.to_string()));
            groups.len() - 1
        });
        groups[idx].add_record(record);
    }
    groups.into_iter().map(GroupStats::into_row).collect()
}

/// One summary row across every record, keyed [`OVERALL_KEY`].
pub fn overall<'a, I>(records: I) -> AggregateRow
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    let mut stats = GroupStats::with_key(OVERALL_KEY.to_string());
    for record in records {
        stats.add_record(record);
    }
    stats.into_row()
}
