//! Top-N selection over aggregate rows or raw records.
//!
//! Sorting is stable, so ties keep the order in which items were supplied.
//! Items whose key value is missing always sort after present values,
//! whichever direction is requested.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::Serialize;

use crate::{aggregate::AggregateRow, dimension::canonical_key, error::QueryError, record::KpiRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKey {
    Mean,
    Min,
    Max,
    Count,
    Records,
    TotalTarget,
    TotalOutput,
    Target,
    Output,
    AchievementPct,
}

impl RankKey {
    pub const ALL: [RankKey; 10] = [
        RankKey::Mean,
        RankKey::Min,
        RankKey::Max,
        RankKey::Count,
        RankKey::Records,
        RankKey::TotalTarget,
        RankKey::TotalOutput,
        RankKey::Target,
        RankKey::Output,
        RankKey::AchievementPct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RankKey::Mean => "mean",
            RankKey::Min => "min",
            RankKey::Max => "max",
            RankKey::Count => "count",
            RankKey::Records => "records",
            RankKey::TotalTarget => "total_target",
            RankKey::TotalOutput => "total_output",
            RankKey::Target => "target",
            RankKey::Output => "output",
            RankKey::AchievementPct => "achievement_pct",
        }
    }
}

impl fmt::Display for RankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankKey {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(value);
        RankKey::ALL
            .into_iter()
            .find(|candidate| candidate.name() == key)
            .ok_or_else(|| QueryError::UnknownRankKey(value.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Ascending,
    #[default]
    Descending,
}

/// Something that can be ordered by a [`RankKey`].
pub trait Rankable {
    const KIND: &'static str;

    fn supports(key: RankKey) -> bool;

    /// `None` when the item has no value for a supported key.
    fn rank_value(&self, key: RankKey) -> Option<f64>;
}

impl Rankable for AggregateRow {
    const KIND: &'static str = "aggregate rows";

    fn supports(key: RankKey) -> bool {
        !matches!(key, RankKey::Target | RankKey::Output | RankKey::AchievementPct)
    }

    fn rank_value(&self, key: RankKey) -> Option<f64> {
        match key {
            RankKey::Mean => self.mean,
            RankKey::Min => self.min,
            RankKey::Max => self.max,
            RankKey::Count => Some(self.count as f64),
            RankKey::Records => Some(self.record_count as f64),
            RankKey::TotalTarget => Some(self.total_target),
            RankKey::TotalOutput => Some(self.total_output),
            RankKey::Target | RankKey::Output | RankKey::AchievementPct => None,
        }
    }
}

impl Rankable for KpiRecord {
    const KIND: &'static str = "records";

    fn supports(key: RankKey) -> bool {
        matches!(key, RankKey::Target | RankKey::Output | RankKey::AchievementPct)
    }

    fn rank_value(&self, key: RankKey) -> Option<f64> {
        match key {
            RankKey::Target => self.target,
            RankKey::Output => self.output,
            RankKey::AchievementPct => self.achievement_pct,
            _ => None,
        }
    }
}

impl<T: Rankable> Rankable for &T {
    const KIND: &'static str = T::KIND;

    fn supports(key: RankKey) -> bool {
        T::supports(key)
    }

    fn rank_value(&self, key: RankKey) -> Option<f64> {
        (**self).rank_value(key)
    }
}

/// Orders `items` by `key` and keeps at most `n` of them.
pub fn top_n<I, T>(items: I, key: RankKey, n: usize, direction: Direction) -> Result<Vec<T>, QueryError>
where
    I: IntoIterator<Item = T>,
    T: Rankable,
{
    if !T::supports(key) {
        return Err(QueryError::UnsupportedRankKey {
            key: key.to_string(),
            target: T::KIND,
        });
    }
    let mut keyed = items
        .into_iter()
        .map(|item| (item.rank_value(key), item))
        .collect::<Vec<_>>();
    keyed.sort_by(|(a, _), (b, _)| compare(*a, *b, direction));
    keyed.truncate(n);
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

/// Full ordering without truncation.
pub fn sorted<I, T>(items: I, key: RankKey, direction: Direction) -> Result<Vec<T>, QueryError>
where
    I: IntoIterator<Item = T>,
    T: Rankable,
{
    top_n(items, key, usize::MAX, direction)
}

/// The single highest-ranked item, if any.
pub fn best<I, T>(items: I, key: RankKey) -> Result<Option<T>, QueryError>
where
    I: IntoIterator<Item = T>,
    T: Rankable,
{
    Ok(top_n(items, key, 1, Direction::Descending)?.into_iter().next())
}

fn compare(a: Option<f64>, b: Option<f64>, direction: Direction) -> Ordering {
    match (a, b) {
        // Present values are finite, and -0.0 must tie with 0.0.
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_trail_in_both_directions() {
        assert_eq!(compare(Some(1.0), None, Direction::Ascending), Ordering::Less);
        assert_eq!(compare(Some(1.0), None, Direction::Descending), Ordering::Less);
        assert_eq!(compare(None, None, Direction::Descending), Ordering::Equal);
    }

    #[test]
    fn signed_zeros_compare_equal() {
        assert_eq!(compare(Some(-0.0), Some(0.0), Direction::Ascending), Ordering::Equal);
        assert_eq!(compare(Some(0.0), Some(-0.0), Direction::Descending), Ordering::Equal);
    }

    #[test]
    fn rank_key_names_round_trip_through_parsing() {
        for key in RankKey::ALL {
            assert_eq!(key.name().parse::<RankKey>(), Ok(key));
        }
        assert_eq!("Total-Target".parse::<RankKey>(), Ok(RankKey::TotalTarget));
        assert!("median".parse::<RankKey>().is_err());
    }
}
