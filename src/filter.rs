use crate::error::{Error, Result};
use crate::record::Record;
use crate::region::Region;
use crate::schema::Schema;
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};

/// Matching rows of one fragment.
#[derive(Debug)]
pub struct FilteredResult {
    pub fragment: PathBuf,
    pub records: Vec<Record>,
}

/// Parses every row of `fragment` and keeps those strictly inside `region`.
/// The first malformed row fails the whole fragment. Quotes are plain
/// characters: fragments are cut on raw newlines, so a row never spans lines.
pub fn filter_fragment(fragment: &Path, region: &Region, schema: &Schema) -> Result<FilteredResult> {
    let parse_failure = |line: u64, reason: String| Error::FragmentParseFailure {
        fragment: fragment.to_path_buf(),
        line,
        reason,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(schema.delimiter)
        .from_path(fragment)
        .map_err(|e| parse_failure(0, e.to_string()))?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| parse_failure(idx as u64 + 1, e.to_string()))?;
        let line = row.position().map_or(idx as u64 + 1, |pos| pos.line());
        let record = Record::parse(&row, schema).map_err(|reason| parse_failure(line, reason))?;
        if region.contains(&record.location) {
            records.push(record);
        }
    }
    Ok(FilteredResult {
        fragment: fragment.to_path_buf(),
        records,
    })
}
