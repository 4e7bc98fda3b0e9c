//! Row helpers shared by the readers and the tail.

use navgraph_core::{FeedError, FeedResult};

/// CSV reader configured for hand-written files: no implicit header, ragged
/// rows allowed, whitespace trimmed around every field.
pub(crate) fn csv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Case-insensitive match of the first two fields against `expected`.
pub(crate) fn matches_header(fields: &[&str], expected: [&str; 2]) -> bool {
    fields.len() >= 2
        && fields[0].trim().eq_ignore_ascii_case(expected[0])
        && fields[1].trim().eq_ignore_ascii_case(expected[1])
}

pub(crate) fn check_header(fields: &[&str], expected: [&str; 2]) -> FeedResult<()> {
    if matches_header(fields, expected) {
        Ok(())
    } else {
        Err(FeedError::Header {
            expected: expected.join(","),
            found: fields.join(","),
        })
    }
}

pub(crate) fn missing_header(expected: [&str; 2]) -> FeedError {
    FeedError::Header {
        expected: expected.join(","),
        found: String::new(),
    }
}

pub(crate) fn parse_number(field: &str, line: u64, what: &str) -> FeedResult<f64> {
    field
        .parse::<f64>()
        .map_err(|_| FeedError::parse(line, format!("invalid {what} '{field}'")))
}

pub(crate) fn from_csv(e: csv::Error) -> FeedError {
    match e.position() {
        Some(pos) => FeedError::parse(pos.line(), e.to_string()),
        None => FeedError::Io(e.to_string()),
    }
}

pub(crate) fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}
