use serde::Serialize;

use crate::dimension::{Dimension, Metric, UNKNOWN};

/// One normalized KPI item.
///
/// Every dimension holds a non-empty category (possibly [`UNKNOWN`]); every
/// metric is either a finite number or `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRecord {
    pub description: String,
    pub quarter: String,
    pub province: String,
    pub region: String,
    pub district: String,
    pub focus_area: String,
    pub pillar: String,
    pub anchor_community: String,
    pub project_owner: String,
    pub target: Option<f64>,
    pub output: Option<f64>,
    pub achievement_pct: Option<f64>,
}

impl Default for KpiRecord {
    fn default() -> Self {
        Self {
            description: UNKNOWN.to_string(),
            quarter: UNKNOWN.to_string(),
            province: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            district: UNKNOWN.to_string(),
            focus_area: UNKNOWN.to_string(),
            pillar: UNKNOWN.to_string(),
            anchor_community: UNKNOWN.to_string(),
            project_owner: UNKNOWN.to_string(),
            target: None,
            output: None,
            achievement_pct: None,
        }
    }
}

impl KpiRecord {
    pub fn dimension(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Quarter => &self.quarter,
            Dimension::Province => &self.province,
            Dimension::Region => &self.region,
            Dimension::District => &self.district,
            Dimension::FocusArea => &self.focus_area,
            Dimension::Pillar => &self.pillar,
            Dimension::AnchorCommunity => &self.anchor_community,
            Dimension::ProjectOwner => &self.project_owner,
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Target => self.target,
            Metric::Output => self.output,
            Metric::AchievementPct => self.achievement_pct,
        }
    }

    pub(crate) fn dimension_mut(&mut self, dimension: Dimension) -> &mut String {
        match dimension {
            Dimension::Quarter => &mut self.quarter,
            Dimension::Province => &mut self.province,
            Dimension::Region => &mut self.region,
            Dimension::District => &mut self.district,
            Dimension::FocusArea => &mut self.focus_area,
            Dimension::Pillar => &mut self.pillar,
            Dimension::AnchorCommunity => &mut self.anchor_community,
            Dimension::ProjectOwner => &mut self.project_owner,
        }
    }

    pub(crate) fn metric_mut(&mut self, metric: Metric) -> &mut Option<f64> {
        match metric {
            Metric::Target => &mut self.target,
            Metric::Output => &mut self.output,
            Metric::AchievementPct => &mut self.achievement_pct,
        }
    }

    /// Builder used by fixtures and in-memory callers. Blank values become [`UNKNOWN`].
    pub fn with_dimension(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        *self.dimension_mut(dimension) = if trimmed.is_empty() {
            UNKNOWN.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }

    pub fn with_metric(mut self, metric: Metric, value: Option<f64>) -> Self {
        *self.metric_mut(metric) = value.filter(|v| v.is_finite());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
