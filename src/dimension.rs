//! The fixed vocabulary of the dataset: filter dimensions, numeric metrics and
//! the source headers each of them is read from.
//!
//! Both sets are closed. Names arriving as text (CLI arguments, query strings)
//! are resolved through [`Dimension::from_str`] and [`Metric::from_str`], which
//! reject anything outside the vocabulary as an invalid query.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::error::QueryError;

/// Category substituted for absent, empty or whitespace-only dimension values.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Quarter,
    Province,
    Region,
    District,
    FocusArea,
    Pillar,
    AnchorCommunity,
    ProjectOwner,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Quarter,
        Dimension::Province,
        Dimension::Region,
        Dimension::District,
        Dimension::FocusArea,
        Dimension::Pillar,
        Dimension::AnchorCommunity,
        Dimension::ProjectOwner,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Quarter => "quarter",
            Dimension::Province => "province",
            Dimension::Region => "region",
            Dimension::District => "district",
            Dimension::FocusArea => "focus_area",
            Dimension::Pillar => "pillar",
            Dimension::AnchorCommunity => "anchor_community",
            Dimension::ProjectOwner => "project_owner",
        }
    }

    /// Header names this dimension is read from, canonical name first.
    pub fn header_aliases(self) -> &'static [&'static str] {
        match self {
            Dimension::Quarter => &["quarter", "KWARTAAL"],
            Dimension::Province => &["province", "PROVINSIE"],
            Dimension::Region => &["region", "STREEK"],
            Dimension::District => &["district", "DISTRIK"],
            Dimension::FocusArea => &["focus_area", "2026 FOKUS"],
            Dimension::Pillar => &["pillar", "2030 TOEKOMSVISIE"],
            Dimension::AnchorCommunity => &["anchor_community", "ANKERGEMEENSKAP"],
            Dimension::ProjectOwner => &["project_owner", "PROJEKEIENAAR"],
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dimension {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(value);
        Dimension::ALL
            .into_iter()
            .find(|dimension| dimension.name() == key)
            .ok_or_else(|| QueryError::UnknownDimension(value.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Target,
    Output,
    AchievementPct,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Target, Metric::Output, Metric::AchievementPct];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Target => "target",
            Metric::Output => "output",
            Metric::AchievementPct => "achievement_pct",
        }
    }

    pub fn header_aliases(self) -> &'static [&'static str] {
        match self {
            Metric::Target => &["target", "TEIKEN"],
            Metric::Output => &["output", "UITSET"],
            Metric::AchievementPct => &["achievement_pct", "% BEHAAL"],
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(value);
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name() == key)
            .ok_or_else(|| QueryError::UnknownMetric(value.trim().to_string()))
    }
}

/// Headers carrying the free-text project description.
pub const DESCRIPTION_ALIASES: &[&str] = &["description", "BESKRYWING VAN PROJEK"];

/// Case-insensitive header lookup over a set of aliases.
pub fn find_header(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim();
        aliases.iter().any(|alias| header.eq_ignore_ascii_case(alias))
    })
}

/// Lowercases and folds `-` and spaces to `_` so `Focus-Area` resolves like `focus_area`.
pub(crate) fn canonical_key(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
