#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use kpi_dashboard::{
    dimension::{Dimension, Metric},
    record::KpiRecord,
    snapshot::Snapshot,
    source::CsvSource,
};
use tempfile::{TempDir, tempdir};

pub const PLAN_FILE: &str = "kpi_plan.csv";
pub const PLAN_WORKBOOK: &str = "kpi_plan.xlsx";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Snapshot of the six-row planning fixture.
pub fn plan_snapshot() -> Snapshot {
    Snapshot::load(&CsvSource::new(fixture_path(PLAN_FILE))).expect("load plan fixture")
}

/// Record with one grouping dimension and an achievement value.
pub fn record(dimension: Dimension, key: &str, achievement: Option<f64>) -> KpiRecord {
    KpiRecord::default()
        .with_dimension(dimension, key)
        .with_metric(Metric::AchievementPct, achievement)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    /// Writes raw bytes, for inputs that are not valid UTF-8.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}
