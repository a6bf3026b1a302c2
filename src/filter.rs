use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::{
    dimension::{Dimension, UNKNOWN},
    error::QueryError,
    record::KpiRecord,
};

/// Allowed values for one dimension.
///
/// `Any` leaves the dimension unconstrained. `Only` with an empty set admits
/// nothing, which is not the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Constraint {
    #[default]
    Any,
    Only(BTreeSet<String>),
}

impl Constraint {
    pub fn admits(&self, value: &str) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Only(allowed) => allowed.contains(value),
        }
    }
}

/// Active filters across dimensions. Dimensions combine with AND, values
/// within one dimension with OR.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    constraints: BTreeMap<Dimension, Constraint>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = values.into_iter().map(Into::into).collect();
        self.constraints
            .insert(dimension, Constraint::Only(allowed));
        self
    }

    pub fn any(mut self, dimension: Dimension) -> Self {
        self.constraints.insert(dimension, Constraint::Any);
        self
    }

    pub fn constraint(&self, dimension: Dimension) -> &Constraint {
        const ANY: &Constraint = &Constraint::Any;
        self.constraints.get(&dimension).unwrap_or(ANY)
    }

    pub fn matches(&self, record: &KpiRecord) -> bool {
        self.constraints
            .iter()
            .all(|(dimension, constraint)| constraint.admits(record.dimension(*dimension)))
    }

    /// Builds a selection from `dimension=v1,v2` expressions.
    ///
    /// `dimension=*` is explicitly unconstrained and `dimension=` selects the
    /// empty set. A dimension may appear at most once.
    pub fn parse<S: AsRef<str>>(filters: &[S]) -> Result<Self, QueryError> {
        let mut selection = Selection::all();
        for filter in filters {
            let (dimension, constraint) = parse_filter(filter.as_ref())?;
            if selection.constraints.contains_key(&dimension) {
                return Err(QueryError::MalformedFilter(format!(
                    "{} (dimension '{dimension}' filtered more than once)",
                    filter.as_ref().trim()
                )));
            }
            selection.constraints.insert(dimension, constraint);
        }
        Ok(selection)
    }
}

fn parse_filter(filter: &str) -> Result<(Dimension, Constraint), QueryError> {
    let trimmed = filter.trim();
    let Some((left, right)) = trimmed.split_once('=') else {
        return Err(QueryError::MalformedFilter(trimmed.to_string()));
    };
    if left.trim().is_empty() {
        return Err(QueryError::MalformedFilter(trimmed.to_string()));
    }
    let dimension: Dimension = left.parse()?;
    let right = right.trim();
    let constraint = if right == "*" {
        Constraint::Any
    } else {
        Constraint::Only(
            split_values(right)
                .into_iter()
                .map(|value| unquote(value.trim()).trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect(),
        )
    };
    Ok((dimension, constraint))
}

/// Splits on commas that sit outside single or double quotes.
fn split_values(values: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in values.char_indices() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (None, ',') => {
                parts.push(&values[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&values[start..]);
    parts
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Records admitted by `selection`, in input order.
pub fn apply<'a, I>(records: I, selection: &Selection) -> Vec<&'a KpiRecord>
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    records
        .into_iter()
        .filter(|record| selection.matches(record))
        .collect()
}

/// Case-insensitive substring search over description, anchor community and
/// project owner. A blank query matches every record.
pub fn search<'a, I>(records: I, text: &str) -> Vec<&'a KpiRecord>
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    let needle = text.trim().to_lowercase();
    records
        .into_iter()
        .filter(|record| {
            needle.is_empty()
                || [
                    record.description.as_str(),
                    record.anchor_community.as_str(),
                    record.project_owner.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Sorted distinct values of a dimension, without the unknown category.
pub fn dimension_values<'a, I>(records: I, dimension: Dimension) -> Vec<String>
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    records
        .into_iter()
        .map(|record| record.dimension(dimension))
        .filter(|value| *value != UNKNOWN)
        .unique()
        .sorted()
        .map(str::to_string)
        .collect()
}
