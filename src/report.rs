//! Dashboard sections built from filtered subsets.
//!
//! Each view takes the already-filtered records and composes the
//! aggregation and ranking primitives; nothing here touches a snapshot or
//! renders output.

use serde::Serialize;

use crate::{
    aggregate::{AggregateRow, aggregate, overall},
    dimension::Dimension,
    error::QueryError,
    filter::search,
    rank::{Direction, RankKey, best, sorted, top_n},
    record::KpiRecord,
};

/// Number of anchor communities shown in the overview.
pub const TOP_COMMUNITIES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveOverview {
    pub record_count: usize,
    pub overall_mean: Option<f64>,
    pub best_pillar: Option<AggregateRow>,
    pub best_focus_area: Option<AggregateRow>,
    pub pillars: Vec<AggregateRow>,
    pub focus_areas: Vec<AggregateRow>,
    pub top_communities: Vec<AggregateRow>,
}

pub fn executive_overview(subset: &[&KpiRecord]) -> Result<ExecutiveOverview, QueryError> {
    let summary = overall(subset.iter().copied());
    let pillars = ranked_groups(subset, Dimension::Pillar)?;
    let focus_areas = ranked_groups(subset, Dimension::FocusArea)?;
    let communities = aggregate(subset.iter().copied(), Dimension::AnchorCommunity);
    Ok(ExecutiveOverview {
        record_count: summary.record_count,
        overall_mean: summary.mean,
        best_pillar: best(&pillars, RankKey::Mean)?.cloned(),
        best_focus_area: best(&focus_areas, RankKey::Mean)?.cloned(),
        top_communities: top_n(communities, RankKey::Mean, TOP_COMMUNITIES, Direction::Descending)?,
        pillars,
        focus_areas,
    })
}

/// Groups by `dimension`, ordered from weakest to strongest mean; groups
/// without achievement values come last.
pub fn ranked_groups(subset: &[&KpiRecord], dimension: Dimension) -> Result<Vec<AggregateRow>, QueryError> {
    sorted(
        aggregate(subset.iter().copied(), dimension),
        RankKey::Mean,
        Direction::Ascending,
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyView {
    pub dimension: Dimension,
    pub groups: Vec<AggregateRow>,
}

/// Dimensions the strategy view can break down by.
pub const STRATEGY_DIMENSIONS: [Dimension; 2] = [Dimension::Pillar, Dimension::FocusArea];

pub fn strategy(subset: &[&KpiRecord], dimension: Dimension) -> Result<StrategyView, QueryError> {
    if !STRATEGY_DIMENSIONS.contains(&dimension) {
        return Err(QueryError::UnsupportedDimension {
            dimension: dimension.to_string(),
            view: "strategy",
        });
    }
    Ok(StrategyView {
        dimension,
        groups: ranked_groups(subset, dimension)?,
    })
}

/// Records of one group, in input order.
pub fn group_detail<'a>(subset: &[&'a KpiRecord], dimension: Dimension, value: &str) -> Vec<&'a KpiRecord> {
    subset
        .iter()
        .copied()
        .filter(|record| record.dimension(dimension) == value)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct GeographyView {
    pub provinces: Vec<AggregateRow>,
    pub province: Option<String>,
    pub districts: Vec<AggregateRow>,
    pub communities: Vec<AggregateRow>,
}

/// Province table plus the district and anchor community breakdown of one
/// province. Without a chosen province the weakest one is detailed.
pub fn geography(subset: &[&KpiRecord], province: Option<&str>) -> Result<GeographyView, QueryError> {
    let provinces = ranked_groups(subset, Dimension::Province)?;
    let province = province
        .map(str::to_string)
        .or_else(|| provinces.first().map(|row| row.key.clone()));
    let (districts, communities) = match &province {
        Some(name) => {
            let within = group_detail(subset, Dimension::Province, name);
            (
                ranked_groups(&within, Dimension::District)?,
                ranked_groups(&within, Dimension::AnchorCommunity)?,
            )
        }
        None => (Vec::new(), Vec::new()),
    };
    Ok(GeographyView {
        provinces,
        province,
        districts,
        communities,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectsView<'a> {
    pub owners: Vec<AggregateRow>,
    pub projects: Vec<&'a KpiRecord>,
}

/// Owner table plus the projects matching `text` and `owners`, weakest
/// achievement first. An empty owner list does not restrict projects.
pub fn projects<'a>(
    subset: &[&'a KpiRecord],
    text: &str,
    owners: &[String],
) -> Result<ProjectsView<'a>, QueryError> {
    let owner_table = ranked_groups(subset, Dimension::ProjectOwner)?;
    let matches = search(subset.iter().copied(), text)
        .into_iter()
        .filter(|record| owners.is_empty() || owners.iter().any(|o| o == &record.project_owner))
        .collect::<Vec<_>>();
    Ok(ProjectsView {
        owners: owner_table,
        projects: sorted(matches, RankKey::AchievementPct, Direction::Ascending)?,
    })
}
