//! `NAME,PRICE` price files, in and out.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use navgraph_core::{ComponentKind, FeedError, FeedResult, PriceEvent, PriceSink, PriceUpdate};

use crate::rows::{
    check_header, csv_reader, from_csv, line_of, matches_header, missing_header, parse_number,
};

/// Header of price input and output files.
pub const PRICE_HEADER: [&str; 2] = ["NAME", "PRICE"];

/// Parses one `name,price` row.
pub(crate) fn parse_price_row(fields: &[&str], line: u64) -> FeedResult<PriceUpdate> {
    match fields {
        [name, price] if !name.is_empty() => Ok(PriceUpdate::new(
            *name,
            parse_number(price, line, "price")?,
        )),
        [name, _] if name.is_empty() => Err(FeedError::parse(line, "empty name")),
        _ => Err(FeedError::parse(
            line,
            format!("expected two fields, got {}", fields.len()),
        )),
    }
}

// =============================================================================
// READER
// =============================================================================

/// Streams [`PriceUpdate`]s out of a price file.
pub struct PriceReader<R> {
    records: csv::StringRecordsIntoIter<R>,
    header_checked: bool,
}

impl PriceReader<File> {
    /// Opens a price file.
    pub fn from_path(path: impl AsRef<Path>) -> FeedResult<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> PriceReader<R> {
    /// Reads price rows from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            records: csv_reader(reader).into_records(),
            header_checked: false,
        }
    }
}

impl<R: Read> Iterator for PriceReader<R> {
    type Item = FeedResult<PriceUpdate>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next() {
                Some(Ok(record)) => record,
                Some(Err(e)) => return Some(Err(from_csv(e))),
                None if !self.header_checked => {
                    self.header_checked = true;
                    return Some(Err(missing_header(PRICE_HEADER)));
                }
                None => return None,
            };
            let fields: Vec<&str> = record.iter().collect();

            if !self.header_checked {
                self.header_checked = true;
                if let Err(e) = check_header(&fields, PRICE_HEADER) {
                    return Some(Err(e));
                }
                continue;
            }
            if fields.iter().all(|f| f.is_empty()) || matches_header(&fields, PRICE_HEADER) {
                continue;
            }

            return Some(parse_price_row(&fields, line_of(&record)));
        }
    }
}

/// Reads a whole price file, stopping at the first bad row.
pub fn read_prices(path: impl AsRef<Path>) -> FeedResult<Vec<PriceUpdate>> {
    PriceReader::from_path(path)?.collect()
}

// =============================================================================
// WRITER
// =============================================================================

/// [`PriceSink`] writing one `name,price` row per event.
pub struct CsvPriceWriter<W: Write> {
    writer: csv::Writer<W>,
    precision: Option<usize>,
    include_stocks: bool,
}

impl CsvPriceWriter<File> {
    /// Creates (or truncates) a price file.
    pub fn create(path: impl AsRef<Path>) -> FeedResult<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> CsvPriceWriter<W> {
    /// Writes the header to `writer`.
    pub fn new(writer: W) -> FeedResult<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(PRICE_HEADER).map_err(from_csv)?;
        Ok(Self {
            writer,
            precision: None,
            include_stocks: true,
        })
    }

    /// Fixed number of decimal places (shortest round-trip form when unset).
    #[must_use]
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Whether stock events are written.
    #[must_use]
    pub fn with_stocks(mut self, include: bool) -> Self {
        self.include_stocks = include;
        self
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> FeedResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| FeedError::Io(e.error().to_string()))
    }
}

impl<W: Write> PriceSink for CsvPriceWriter<W> {
    fn publish(&mut self, event: &PriceEvent) -> FeedResult<()> {
        if event.kind == ComponentKind::Stock && !self.include_stocks {
            return Ok(());
        }
        let price = match self.precision {
            Some(p) => format!("{:.p$}", event.price),
            None => event.price.to_string(),
        };
        self.writer
            .write_record([event.name.as_str(), price.as_str()])
            .map_err(from_csv)
    }

    fn flush(&mut self) -> FeedResult<()> {
        self.writer.flush().map_err(FeedError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows() {
        let text = "NAME,PRICE\nAAPL,150.5\n\nMSFT, 300\nname,price\n";
        let updates: Vec<_> = PriceReader::new(text.as_bytes())
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            updates,
            vec![PriceUpdate::new("AAPL", 150.5), PriceUpdate::new("MSFT", 300.0)]
        );
    }

    #[test]
    fn test_rejects_structure_header() {
        let first = PriceReader::new("NAME,SHARES\nA,1\n".as_bytes()).next().unwrap();
        assert_eq!(
            first,
            Err(FeedError::Header {
                expected: "NAME,PRICE".into(),
                found: "NAME,SHARES".into(),
            })
        );
    }

    #[test]
    fn test_bad_rows() {
        let results: Vec<_> = PriceReader::new("NAME,PRICE\nA\nB,abc\n,1\nC,2\n".as_bytes()).collect();
        assert!(matches!(results[0], Err(FeedError::Parse { line: 2, .. })));
        assert!(matches!(results[1], Err(FeedError::Parse { line: 3, .. })));
        assert!(matches!(results[2], Err(FeedError::Parse { line: 4, .. })));
        assert_eq!(results[3], Ok(PriceUpdate::new("C", 2.0)));
    }

    #[test]
    fn test_writer_rows() {
        let mut writer = CsvPriceWriter::new(Vec::new()).unwrap().with_precision(2);
        writer
            .publish(&PriceEvent::new("A".into(), ComponentKind::Stock, 10.0))
            .unwrap();
        writer
            .publish(&PriceEvent::new("P".into(), ComponentKind::Portfolio, 20.126))
            .unwrap();

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "NAME,PRICE\nA,10.00\nP,20.13\n");
    }

    #[test]
    fn test_writer_can_skip_stocks() {
        let mut writer = CsvPriceWriter::new(Vec::new()).unwrap().with_stocks(false);
        writer
            .publish_batch(&[
                PriceEvent::new("A".into(), ComponentKind::Stock, 10.0),
                PriceEvent::new("P".into(), ComponentKind::Portfolio, 20.0),
            ])
            .unwrap();

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "NAME,PRICE\nP,20\n");
    }
}
