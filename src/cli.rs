use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Filter and aggregate KPI planning data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Aggregate achievement, target and output per group of a dimension
    Summary(SummaryArgs),
    /// Rank the groups of a dimension by a summary statistic
    Top(TopArgs),
    /// Overall achievement, best pillar and focus area, top anchor communities
    Overview(ViewArgs),
    /// Pillar or focus area breakdown, optionally listing one group's records
    Strategy(StrategyArgs),
    /// Province breakdown with districts and anchor communities of one province
    Geography(GeographyArgs),
    /// Project owner breakdown and project search
    Projects(ProjectsArgs),
    /// List the values available for filtering a dimension
    Options(OptionsArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Input file holding the KPI sheet (.csv, .tsv or .xlsx)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Worksheet to read from an .xlsx workbook (defaults to "2026 BEPLANNING")
    #[arg(long)]
    pub sheet: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of a delimited input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Dimension filters such as `province=Gauteng,Limpopo` (`dim=*` allows all, `dim=` allows none)
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Dimension to group by (e.g. province, focus_area, anchor_community)
    #[arg(long = "by")]
    pub by: String,
    /// Sort groups by a statistic instead of first appearance
    #[arg(long = "sort-by")]
    pub sort_by: Option<String>,
    /// Sort ascending instead of descending
    #[arg(long)]
    pub ascending: bool,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Dimension to group by before ranking
    #[arg(long = "by")]
    pub by: String,
    /// Statistic to rank by (mean, min, max, count, records, total_target, total_output)
    #[arg(long, default_value = "mean")]
    pub key: String,
    /// Number of groups to keep
    #[arg(short = 'n', long = "top", default_value_t = 5)]
    pub n: usize,
    /// Rank from the lowest value instead of the highest
    #[arg(long)]
    pub ascending: bool,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct StrategyArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Grouping dimension (pillar or focus_area)
    #[arg(long = "by", default_value = "pillar")]
    pub by: String,
    /// List the records of this group after the summary
    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Debug, Args)]
pub struct GeographyArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Province to break down into districts and anchor communities
    #[arg(long)]
    pub province: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Case-insensitive text matched against description, anchor community and owner
    #[arg(long, default_value = "")]
    pub search: String,
    /// Restrict projects to these owners
    #[arg(long = "owner", action = clap::ArgAction::Append)]
    pub owners: Vec<String>,
    /// Maximum number of projects to list
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Dimension whose values should be listed
    #[arg(long)]
    pub dimension: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
