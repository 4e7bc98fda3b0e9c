//! Block-structured structure files.
//!
//! ```text
//! NAME,SHARES
//! TECH,            <- opens a portfolio block
//! AAPL,100         <- TECH holds 100 AAPL
//! MSFT,200
//! INDUSTRIALS
//! TECH,2           <- INDUSTRIALS holds 2 TECH
//! ```
//!
//! A row with one field, or an empty second field, declares a portfolio and
//! makes it the current block. A `name,quantity` row declares that the current
//! block holds `quantity` units of `name`. Repeated header rows are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use navgraph_core::{Declaration, FeedError, FeedResult};

use crate::rows::{
    check_header, csv_reader, from_csv, line_of, matches_header, missing_header, parse_number,
};

/// Expected header of a structure file.
pub const STRUCTURE_HEADER: [&str; 2] = ["NAME", "SHARES"];

/// Streams [`Declaration`]s out of a structure file.
pub struct StructureReader<R> {
    records: csv::StringRecordsIntoIter<R>,
    current: Option<String>,
    header_checked: bool,
}

impl StructureReader<File> {
    /// Opens a structure file.
    pub fn from_path(path: impl AsRef<Path>) -> FeedResult<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> StructureReader<R> {
    /// Reads structure rows from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            records: csv_reader(reader).into_records(),
            current: None,
            header_checked: false,
        }
    }

    fn declaration(&mut self, fields: &[&str], line: u64) -> FeedResult<Declaration> {
        if fields[0].is_empty() {
            return Err(FeedError::parse(line, "empty name"));
        }

        if fields.len() == 1 || fields[1].is_empty() {
            self.current = Some(fields[0].to_string());
            return Ok(Declaration::container(fields[0]));
        }

        if fields.len() > 2 {
            return Err(FeedError::parse(
                line,
                format!("expected one or two fields, got {}", fields.len()),
            ));
        }

        let parent = self.current.as_deref().ok_or_else(|| {
            FeedError::parse(line, format!("holding '{}' before any portfolio", fields[0]))
        })?;
        let quantity = parse_number(fields[1], line, "quantity")?;
        Ok(Declaration::holding(fields[0], quantity, parent))
    }
}

impl<R: Read> Iterator for StructureReader<R> {
    type Item = FeedResult<Declaration>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next() {
                Some(Ok(record)) => record,
                Some(Err(e)) => return Some(Err(from_csv(e))),
                None if !self.header_checked => {
                    self.header_checked = true;
                    return Some(Err(missing_header(STRUCTURE_HEADER)));
                }
                None => return None,
            };
            let fields: Vec<&str> = record.iter().collect();

            if !self.header_checked {
                self.header_checked = true;
                if let Err(e) = check_header(&fields, STRUCTURE_HEADER) {
                    return Some(Err(e));
                }
                continue;
            }
            if fields.iter().all(|f| f.is_empty()) || matches_header(&fields, STRUCTURE_HEADER) {
                continue;
            }

            return Some(self.declaration(&fields, line_of(&record)));
        }
    }
}

/// Reads a whole structure file, stopping at the first bad row.
pub fn read_structure(path: impl AsRef<Path>) -> FeedResult<Vec<Declaration>> {
    StructureReader::from_path(path)?.collect()
}
