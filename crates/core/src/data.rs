//! Per-slide replacement data loaded from a CSV file.
//!
//! The file has a header row with `slide_num`, `placeholder` and `value`
//! columns. Rows are folded into one [`SlideRecord`] per slide number, in the
//! order slide numbers first appear.

use crate::error::{Error, Result};
use crate::options::FillOptions;
use crate::types::{InputRow, SlideRecord};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const SLIDE_NUM_COLUMN: &str = "slide_num";
const PLACEHOLDER_COLUMN: &str = "placeholder";
const VALUE_COLUMN: &str = "value";

/// Slide records indexed by slide number.
#[derive(Debug, Clone, Default)]
pub struct DataIndex {
    records: Vec<SlideRecord>,
}

impl DataIndex {
    /// Load slide data from a CSV file.
    pub fn from_path(path: impl AsRef<Path>, options: &FillOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::MalformedInput(format!("data file not found: {}", path.display()))
            } else {
                Error::IoError(e)
            }
        })?;
        log::debug!("Loading slide data from {}", path.display());
        Self::from_reader(BufReader::new(file), options)
    }

    /// Load slide data from any CSV reader.
    pub fn from_reader<R: Read>(reader: R, options: &FillOptions) -> Result<Self> {
        let rows = read_rows(reader, options)?;
        Ok(Self::from_rows(rows, options))
    }

    /// Build the index from already parsed rows.
    pub fn from_rows<I>(rows: I, options: &FillOptions) -> Self
    where
        I: IntoIterator<Item = InputRow>,
    {
        let mut index = Self::default();
        for row in rows {
            index.insert(row, options);
        }
        log::info!("Loaded data for {} slide(s)", index.records.len());
        index
    }

    fn insert(&mut self, row: InputRow, options: &FillOptions) {
        let pos = match self.records.iter().position(|r| r.slide_num == row.slide_num) {
            Some(pos) => pos,
            None => {
                self.records.push(SlideRecord::new(row.slide_num));
                self.records.len() - 1
            }
        };
        let record = &mut self.records[pos];

        if let Some(idx) = row.position_index() {
            if let Some(path) = options.existing_file(&row.value) {
                log::debug!("Slide {}: placeholder {} bound to image {}", row.slide_num, idx, path.display());
                record.images.insert(idx, path);
            }
        }
        record.content.insert(row.placeholder, row.value);
    }

    /// The record for a 1-based slide number.
    pub fn record(&self, slide_num: u32) -> Option<&SlideRecord> {
        self.records.iter().find(|r| r.slide_num == slide_num)
    }

    /// All records, in the order their slide numbers first appeared.
    pub fn records(&self) -> &[SlideRecord] {
        &self.records
    }

    /// Number of distinct slides with data.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no rows were loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Column positions located from the header row.
struct Columns {
    slide_num: usize,
    placeholder: usize,
    value: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let slide_num = find(SLIDE_NUM_COLUMN)
            .ok_or_else(|| Error::MalformedInput(format!("missing '{}' column", SLIDE_NUM_COLUMN)))?;
        let placeholder = find(PLACEHOLDER_COLUMN)
            .ok_or_else(|| Error::MalformedInput(format!("missing '{}' column", PLACEHOLDER_COLUMN)))?;
        Ok(Self {
            slide_num,
            placeholder,
            value: find(VALUE_COLUMN),
        })
    }
}

fn read_rows<R: Read>(reader: R, options: &FillOptions) -> Result<Vec<InputRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_headers(csv_reader.headers()?)?;

    let mut rows = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Line 1 is the header.
        let line = record.position().map_or(i as u64 + 2, |p| p.line());
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let slide_num = parse_slide_num(cell(columns.slide_num)).ok_or_else(|| {
            Error::MalformedInput(format!(
                "line {}: invalid slide number '{}'",
                line,
                cell(columns.slide_num)
            ))
        })?;
        let value = columns.value.map(cell).unwrap_or("");

        rows.push(InputRow::new(slide_num, cell(columns.placeholder), value));
    }

    Ok(rows)
}

/// Parse a 1-based slide number. Integral floats such as `2.0` are accepted.
fn parse_slide_num(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let n = match raw.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            let f = raw.parse::<f64>().ok()?;
            if f.fract() != 0.0 || f < 1.0 || f > u32::MAX as f64 {
                return None;
            }
            f as u32
        }
    };
    (n >= 1).then_some(n)
}
