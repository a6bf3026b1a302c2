//! Raw row sources feeding the normalizer.
//!
//! A source yields one table of string/numeric/empty cells under a header
//! row. The normalizer makes no other assumption about where rows come from:
//!
//! - [`RawTable`] doubles as an in-memory source.
//! - [`CsvSource`] reads a delimited file, resolving the delimiter from the
//!   file extension (`.tsv` → tab, otherwise comma) and decoding through
//!   `encoding_rs` (UTF-8 unless another label is given).
//! - [`XlsxSource`] reads one named sheet of an `.xlsx` workbook.
//!
//! Any failure to open or parse the table, or to decode its header row, is
//! reported as [`KpiError::SourceUnavailable`]; no partial table is returned.
//! Data cells that do not decode are kept with replacement characters and
//! counted in [`RawTable::lossy_cells`].

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, Xlsx, open_workbook};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::error::{KpiError, Result};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(value)
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

/// One sheet of raw cells. Rows may be shorter or longer than the header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
    /// Data cells whose bytes did not decode cleanly and were kept with
    /// replacement characters.
    pub lossy_cells: usize,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
            lossy_cells: 0,
        }
    }

    pub fn with_row<I, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<RawCell>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// SHA-256 over headers and cells, used to skip reloads of unchanged data.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for header in &self.headers {
            hasher.update(header.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        for row in &self.rows {
            for cell in row {
                match cell {
                    RawCell::Empty => hasher.update([0u8]),
                    RawCell::Text(text) => {
                        hasher.update([1u8]);
                        hasher.update(text.as_bytes());
                    }
                    RawCell::Number(number) => {
                        hasher.update([2u8]);
                        hasher.update(number.to_bits().to_le_bytes());
                    }
                }
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        format!("{:x}", hasher.finalize())
    }
}

pub trait RowSource {
    fn name(&self) -> String;
    fn load(&self) -> Result<RawTable>;
}

impl RowSource for RawTable {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<RawTable> {
        if self.headers.is_empty() {
            return Err(KpiError::source_unavailable(&self.name, "table has no header row"));
        }
        Ok(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let delimiter = resolve_input_delimiter(&path, None);
        Self {
            path,
            delimiter,
            encoding: UTF_8,
        }
    }

    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = resolve_input_delimiter(&self.path, delimiter);
        self
    }

    pub fn with_encoding(mut self, label: Option<&str>) -> Result<Self> {
        self.encoding = resolve_encoding(label).map_err(|reason| {
            KpiError::source_unavailable(self.path.display().to_string(), reason)
        })?;
        Ok(self)
    }

    fn unavailable(&self, reason: impl ToString) -> KpiError {
        KpiError::source_unavailable(self.name(), reason)
    }
}

impl RowSource for CsvSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RawTable> {
        let file = File::open(&self.path)
            .map_err(|err| self.unavailable(format!("cannot open file: {err}")))?;
        let mut reader = open_csv_reader(BufReader::new(file), self.delimiter);

        let header_record = reader
            .byte_headers()
            .map_err(|err| self.unavailable(format!("cannot read header row: {err}")))?
            .clone();
        let (headers, lossy) = decode_record(&header_record, self.encoding);
        if lossy > 0 {
            return Err(self.unavailable(format!(
                "header row: failed to decode text as {}",
                self.encoding.name()
            )));
        }
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(self.unavailable("table has no header row"));
        }

        let mut table = RawTable::new(self.name(), headers);
        for (row_idx, record) in reader.byte_records().enumerate() {
            let row_number = row_idx + 2;
            let record =
                record.map_err(|err| self.unavailable(format!("row {row_number}: {err}")))?;
            let (decoded, lossy) = decode_record(&record, self.encoding);
            if lossy > 0 {
                warn!(
                    "Row {row_number} of {:?}: {lossy} cell(s) not valid {}; kept with replacement characters",
                    self.path,
                    self.encoding.name()
                );
                table.lossy_cells += lossy;
            }
            table.rows.push(decoded.into_iter().map(RawCell::text).collect());
        }
        debug!(
            "Read {} row(s) across {} column(s) from {:?}",
            table.rows.len(),
            table.headers.len(),
            self.path
        );
        Ok(table)
    }
}

/// Sheet holding the KPI plan in the planning workbook.
pub const DEFAULT_SHEET: &str = "2026 BEPLANNING";

#[derive(Debug, Clone)]
pub struct XlsxSource {
    path: PathBuf,
    sheet: String,
}

impl XlsxSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: DEFAULT_SHEET.to_string(),
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = sheet.into();
        self
    }

    fn unavailable(&self, reason: impl ToString) -> KpiError {
        KpiError::source_unavailable(self.name(), reason)
    }
}

impl RowSource for XlsxSource {
    fn name(&self) -> String {
        format!("{}[{}]", self.path.display(), self.sheet)
    }

    fn load(&self) -> Result<RawTable> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .map_err(|err| self.unavailable(format!("cannot open workbook: {err}")))?;
        if !workbook.sheet_names().iter().any(|name| name == &self.sheet) {
            return Err(self.unavailable(format!(
                "sheet '{}' not found (available: {})",
                self.sheet,
                workbook.sheet_names().join(", ")
            )));
        }
        let range = workbook
            .worksheet_range(&self.sheet)
            .map_err(|err| self.unavailable(format!("cannot read sheet: {err}")))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(self.unavailable("table has no header row"));
        }

        let mut table = RawTable::new(self.name(), headers);
        table.rows = rows.map(|cells| cells.iter().map(sheet_cell).collect()).collect();
        debug!(
            "Read {} row(s) across {} column(s) from sheet '{}' of {:?}",
            table.rows.len(),
            table.headers.len(),
            self.sheet,
            self.path
        );
        Ok(table)
    }
}

fn sheet_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::Float(value) => RawCell::Number(*value),
        Data::Int(value) => RawCell::Number(*value as f64),
        Data::DateTime(value) => RawCell::Number(value.as_f64()),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            RawCell::text(text.as_str())
        }
        Data::Bool(value) => RawCell::text(value.to_string()),
    }
}

/// Picks the reader for `path` by extension: `.xlsx`/`.xlsm` are workbooks,
/// anything else is delimited text.
pub fn open_source(
    path: &Path,
    delimiter: Option<u8>,
    encoding: Option<&str>,
    sheet: Option<&str>,
) -> Result<Box<dyn RowSource>> {
    let is_workbook = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm"));
    if is_workbook {
        let source = XlsxSource::new(path);
        Ok(Box::new(match sheet {
            Some(sheet) => source.with_sheet(sheet),
            None => source,
        }))
    } else {
        Ok(Box::new(
            CsvSource::new(path)
                .with_delimiter(delimiter)
                .with_encoding(encoding)?,
        ))
    }
}

pub fn resolve_encoding(label: Option<&str>) -> std::result::Result<&'static Encoding, String> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| format!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

fn open_csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader)
}

/// Decodes every field, substituting U+FFFD for invalid sequences. Returns
/// the fields and how many of them needed a substitution.
fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> (Vec<String>, usize) {
    let mut lossy = 0;
    let fields = record
        .iter()
        .map(|field| {
            let (text, _, had_errors) = encoding.decode(field);
            if had_errors {
                lossy += 1;
            }
            text.into_owned()
        })
        .collect();
    (fields, lossy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(resolve_input_delimiter(Path::new("plan.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("plan.CSV"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("plan.tsv"), Some(b';')), b';');
    }

    #[test]
    fn fingerprint_tracks_cell_changes() {
        let base = RawTable::new("t", vec!["a".into()]).with_row(["1"]);
        let same = RawTable::new("other", vec!["a".into()]).with_row(["1"]);
        let changed = RawTable::new("t", vec!["a".into()]).with_row(["2"]);
        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_ne!(base.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn sheet_cells_map_to_raw_cells() {
        assert_eq!(sheet_cell(&Data::Int(3)), RawCell::Number(3.0));
        assert_eq!(sheet_cell(&Data::Float(80.5)), RawCell::Number(80.5));
        assert_eq!(sheet_cell(&Data::Empty), RawCell::Empty);
        assert_eq!(sheet_cell(&Data::String("Q1".into())), RawCell::Text("Q1".into()));
        assert_eq!(sheet_cell(&Data::String(String::new())), RawCell::Empty);
    }

    #[test]
    fn workbook_extensions_select_the_sheet_reader() {
        let workbook = open_source(Path::new("plan.XLSX"), None, None, Some("Blad1")).unwrap();
        assert_eq!(workbook.name(), "plan.XLSX[Blad1]");
        let csv = open_source(Path::new("plan.csv"), None, None, Some("ignored")).unwrap();
        assert_eq!(csv.name(), "plan.csv");
    }

    #[test]
    fn headerless_in_memory_table_is_unavailable() {
        let err = RawTable::default().load().unwrap_err();
        assert!(err.is_source_unavailable());
    }
}
