//! Subcommand handlers: load a snapshot, apply the filters, build a view and
//! print it as a table or JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::{
    aggregate::{AggregateRow, aggregate},
    cli::{
        GeographyArgs, OptionsArgs, OutputFormat, ProjectsArgs, SourceArgs, StrategyArgs,
        SummaryArgs, TopArgs, ViewArgs,
    },
    dimension::Dimension,
    error::KpiError,
    filter::{self, Selection},
    format::{format_number, format_optional_number, format_percentage},
    rank::{Direction, RankKey, sorted, top_n},
    record::KpiRecord,
    report,
    snapshot::{Snapshot, SnapshotStore},
    source::open_source,
    table::{Align, print_table},
};

const AGGREGATE_ALIGNMENTS: [Align; 7] = [
    Align::Left,
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Right,
];

fn load_snapshot(args: &SourceArgs) -> Result<Arc<Snapshot>> {
    let source = open_source(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        args.sheet.as_deref(),
    )?;
    let store = SnapshotStore::default();
    let snapshot = store
        .load(source.as_ref())
        .with_context(|| format!("Loading KPI records from {:?}", args.input))?;
    let report = snapshot.report();
    if report.missing_achievement > 0 {
        info!(
            "{} of {} row(s) have no usable achievement value",
            report.missing_achievement, report.rows
        );
    }
    Ok(snapshot)
}

fn filtered<'a>(snapshot: &'a Snapshot, args: &SourceArgs) -> Result<Vec<&'a KpiRecord>> {
    let selection = Selection::parse(args.filters.as_slice()).map_err(KpiError::from)?;
    let subset = filter::apply(snapshot.records(), &selection);
    if subset.is_empty() {
        warn!("No records match the current filters");
    } else {
        info!(
            "{} of {} record(s) match the current filters",
            subset.len(),
            snapshot.len()
        );
    }
    Ok(subset)
}

fn parse_dimension(name: &str) -> Result<Dimension> {
    let dimension = name.parse::<Dimension>().map_err(KpiError::from)?;
    Ok(dimension)
}

fn parse_rank_key(name: &str) -> Result<RankKey> {
    let key = name.parse::<RankKey>().map_err(KpiError::from)?;
    Ok(key)
}

fn direction(ascending: bool) -> Direction {
    if ascending {
        Direction::Ascending
    } else {
        Direction::Descending
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing output as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn aggregate_headers(label: &str) -> Vec<String> {
    [label, "items", "mean", "min", "max", "total_target", "total_output"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

fn aggregate_cells(rows: &[AggregateRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                row.key.clone(),
                row.count.to_string(),
                format_percentage(row.mean),
                format_percentage(row.min),
                format_percentage(row.max),
                format_number(row.total_target),
                format_number(row.total_output),
            ]
        })
        .collect()
}

fn print_aggregates(label: &str, rows: &[AggregateRow]) {
    print_table(&aggregate_headers(label), &aggregate_cells(rows), &AGGREGATE_ALIGNMENTS);
}

fn print_records(records: &[&KpiRecord]) {
    let headers = [
        "achievement",
        "description",
        "pillar",
        "focus_area",
        "anchor_community",
        "province",
        "district",
        "region",
        "project_owner",
        "target",
        "output",
        "quarter",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect::<Vec<_>>();
    let rows = records
        .iter()
        .map(|record| {
            vec![
                format_percentage(record.achievement_pct),
                record.description.clone(),
                record.pillar.clone(),
                record.focus_area.clone(),
                record.anchor_community.clone(),
                record.province.clone(),
                record.district.clone(),
                record.region.clone(),
                record.project_owner.clone(),
                format_optional_number(record.target),
                format_optional_number(record.output),
                record.quarter.clone(),
            ]
        })
        .collect::<Vec<_>>();
    print_table(&headers, &rows, &[Align::Right]);
}

pub fn summary(args: &SummaryArgs) -> Result<()> {
    let dimension = parse_dimension(&args.by)?;
    let sort_key = args.sort_by.as_deref().map(parse_rank_key).transpose()?;
    let snapshot = load_snapshot(&args.source)?;
    let subset = filtered(&snapshot, &args.source)?;
    let mut rows = aggregate(subset.iter().copied(), dimension);
    if let Some(key) = sort_key {
        rows = sorted(rows, key, direction(args.ascending)).map_err(KpiError::from)?;
    }
    match args.source.format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => print_aggregates(dimension.name(), &rows),
    }
    info!("Summarized {} group(s) by {}", rows.len(), dimension);
    Ok(())
}

pub fn top(args: &TopArgs) -> Result<()> {
    let dimension = parse_dimension(&args.by)?;
    let key = parse_rank_key(&args.key)?;
    let snapshot = load_snapshot(&args.source)?;
    let subset = filtered(&snapshot, &args.source)?;
    let groups = aggregate(subset.iter().copied(), dimension);
    let ranked = top_n(groups, key, args.n, direction(args.ascending)).map_err(KpiError::from)?;
    match args.source.format {
        OutputFormat::Json => print_json(&ranked)?,
        OutputFormat::Table => print_aggregates(dimension.name(), &ranked),
    }
    Ok(())
}

pub fn overview(args: &ViewArgs) -> Result<()> {
    let snapshot = load_snapshot(&args.source)?;
    let subset = filtered(&snapshot, &args.source)?;
    let view = report::executive_overview(&subset).map_err(KpiError::from)?;
    if args.source.format == OutputFormat::Json {
        #[derive(Serialize)]
        struct OverviewOutput<'a> {
            source: &'a str,
            loaded_at: DateTime<Utc>,
            #[serde(flatten)]
            view: &'a report::ExecutiveOverview,
        }
        return print_json(&OverviewOutput {
            source: snapshot.source_name(),
            loaded_at: snapshot.loaded_at(),
            view: &view,
        });
    }

    println!(
        "Source: {} (loaded {})",
        snapshot.source_name(),
        snapshot.loaded_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Records: {}", view.record_count);
    println!("Average achievement: {}", format_percentage(view.overall_mean));
    for (label, best) in [
        ("Best pillar", &view.best_pillar),
        ("Best focus area", &view.best_focus_area),
    ] {
        match best {
            Some(row) => println!("{label}: {} ({})", row.key, format_percentage(row.mean)),
            None => println!("{label}: -"),
        }
    }
    println!();
    print_aggregates(Dimension::Pillar.name(), &view.pillars);
    println!();
    print_aggregates(Dimension::FocusArea.name(), &view.focus_areas);
    println!();
    println!("Top {} anchor communities", report::TOP_COMMUNITIES);
    print_aggregates(Dimension::AnchorCommunity.name(), &view.top_communities);
    Ok(())
}

pub fn strategy(args: &StrategyArgs) -> Result<()> {
    let dimension = parse_dimension(&args.by)?;
    let snapshot = load_snapshot(&args.source)?;
    let subset = filtered(&snapshot, &args.source)?;
    let view = report::strategy(&subset, dimension).map_err(KpiError::from)?;
    let detail = args
        .group
        .as_deref()
        .map(|group| report::group_detail(&subset, dimension, group));

    if args.source.format == OutputFormat::Json {
        #[derive(Serialize)]
        struct StrategyOutput<'a> {
            #[serde(flatten)]
            view: &'a report::StrategyView,
            detail: Option<&'a [&'a KpiRecord]>,
        }
        return print_json(&StrategyOutput {
            view: &view,
            detail: detail.as_deref(),
        });
    }

    print_aggregates(dimension.name(), &view.groups);
    if let (Some(group), Some(records)) = (&args.group, &detail) {
        println!();
        println!("{} item(s) in {group}", records.len());
        print_records(records);
    }
    Ok(())
}

pub fn geography(args: &GeographyArgs) -> Result<()> {
    let snapshot = load_snapshot(&args.source)?;
    let subset = filtered(&snapshot, &args.source)?;
    let view = report::geography(&subset, args.province.as_deref()).map_err(KpiError::from)?;
    if args.source.format == OutputFormat::Json {
        return print_json(&view);
    }

    print_aggregates(Dimension::Province.name(), &view.provinces);
    if let Some(province) = &view.province {
        println!();
        println!("Districts in {province}");
        print_aggregates(Dimension::District.name(), &view.districts);
        println!();
        println!("Anchor communities in {province}");
        print_aggregates(Dimension::AnchorCommunity.name(), &view.communities);
    }
    Ok(())
}

pub fn projects(args: &ProjectsArgs) -> Result<()> {
    let snapshot = load_snapshot(&args.source)?;
    let subset = filtered(&snapshot, &args.source)?;
    let mut view = report::projects(&subset, &args.search, &args.owners).map_err(KpiError::from)?;
    let matched = view.projects.len();
    if let Some(limit) = args.limit {
        view.projects.truncate(limit);
    }
    if args.source.format == OutputFormat::Json {
        return print_json(&view);
    }

    print_aggregates(Dimension::ProjectOwner.name(), &view.owners);
    println!();
    println!("Projects ({matched} item(s))");
    print_records(&view.projects);
    Ok(())
}

pub fn options(args: &OptionsArgs) -> Result<()> {
    let dimension = parse_dimension(&args.dimension)?;
    let snapshot = load_snapshot(&args.source)?;
    let subset = filtered(&snapshot, &args.source)?;
    let values = filter::dimension_values(subset.iter().copied(), dimension);
    match args.source.format {
        OutputFormat::Json => print_json(&values)?,
        OutputFormat::Table => {
            let rows = values.iter().map(|v| vec![v.clone()]).collect::<Vec<_>>();
            print_table(&[dimension.name().to_string()], &rows, &[]);
        }
    }
    Ok(())
}
