//! Follows a growing price file.
//!
//! A producer thread polls the file for appended bytes, buffers any partial
//! last line, and sends each completed row over a bounded channel. The
//! consumer side is a plain blocking [`Iterator`], so a [`PriceTail`] can be
//! handed straight to the streaming loop.
//!
//! The producer stops when the file has been idle for the configured timeout,
//! when it hits an I/O or header error, or when the [`PriceTail`] is dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, trace};

use navgraph_core::{FeedError, FeedResult, PriceUpdate};

use crate::prices::{parse_price_row, PRICE_HEADER};
use crate::rows::{check_header, csv_reader, matches_header};

/// Polling behaviour of a [`PriceTail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailOptions {
    /// Sleep between reads once the end of the file is reached.
    pub poll_interval: Duration,
    /// Stop after this long without new bytes (follow forever when `None`).
    pub idle_timeout: Option<Duration>,
    /// Rows buffered between the producer thread and the consumer.
    pub capacity: usize,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            idle_timeout: None,
            capacity: 1024,
        }
    }
}

impl TailOptions {
    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// Blocking iterator over the rows of a growing price file.
pub struct PriceTail {
    receiver: Receiver<FeedResult<PriceUpdate>>,
    stop: Arc<AtomicBool>,
}

impl PriceTail {
    /// Opens `path` and starts following it from the beginning.
    pub fn spawn(path: impl AsRef<Path>, options: TailOptions) -> FeedResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let (sender, receiver) = bounded(options.capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));

        let follower = Follower {
            reader: BufReader::new(file),
            sender,
            stop: Arc::clone(&stop),
            options,
        };
        thread::Builder::new()
            .name("navgraph-tail".into())
            .spawn(move || follower.run())?;

        debug!(path = %path.display(), "Tailing price file");
        Ok(Self { receiver, stop })
    }

    /// Asks the producer thread to stop at its next poll.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Iterator for PriceTail {
    type Item = FeedResult<PriceUpdate>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

impl Drop for PriceTail {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Follower {
    reader: BufReader<File>,
    sender: Sender<FeedResult<PriceUpdate>>,
    stop: Arc<AtomicBool>,
    options: TailOptions,
}

/// What to do after a completed line.
enum Flow {
    Continue,
    Stop,
}

impl Follower {
    fn run(mut self) {
        let mut partial = String::new();
        let mut line_no = 0u64;
        let mut header_seen = false;
        let mut idle = Duration::ZERO;

        while !self.stop.load(Ordering::Relaxed) {
            match self.reader.read_line(&mut partial) {
                Ok(0) => {
                    if self.options.idle_timeout.is_some_and(|limit| idle >= limit) {
                        // An unterminated last row still counts once the writer has gone quiet.
                        if !partial.trim().is_empty() {
                            line_no += 1;
                            self.line(&partial, line_no, &mut header_seen);
                        }
                        debug!(lines = line_no, "Tail idle, stopping");
                        break;
                    }
                    thread::sleep(self.options.poll_interval);
                    idle += self.options.poll_interval;
                }
                Ok(_) if !partial.ends_with('\n') => idle = Duration::ZERO,
                Ok(_) => {
                    idle = Duration::ZERO;
                    line_no += 1;
                    let line = std::mem::take(&mut partial);
                    if let Flow::Stop = self.line(&line, line_no, &mut header_seen) {
                        break;
                    }
                }
                Err(e) => {
                    let _ = self.sender.send(Err(e.into()));
                    break;
                }
            }
        }
    }

    fn line(&self, line: &str, line_no: u64, header_seen: &mut bool) -> Flow {
        // Same dialect as PriceReader.
        let record = match csv_reader(line.as_bytes()).into_records().next() {
            None => return Flow::Continue,
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                let item = Err(FeedError::parse(line_no, e.to_string()));
                return self.emit(item, line_no, false);
            }
        };
        let fields: Vec<&str> = record.iter().collect();
        if fields.iter().all(|f| f.is_empty()) {
            return Flow::Continue;
        }

        let (item, fatal) = if !*header_seen {
            *header_seen = true;
            match check_header(&fields, PRICE_HEADER) {
                Ok(()) => return Flow::Continue,
                Err(e) => (Err(e), true),
            }
        } else if matches_header(&fields, PRICE_HEADER) {
            return Flow::Continue;
        } else {
            (parse_price_row(&fields, line_no), false)
        };
        self.emit(item, line_no, fatal)
    }

    fn emit(&self, item: FeedResult<PriceUpdate>, line_no: u64, fatal: bool) -> Flow {
        trace!(line = line_no, ok = item.is_ok(), "Tail row");
        if self.sender.send(item).is_err() || fatal {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::PriceReader;
    use std::io::Write;

    fn fast() -> TailOptions {
        TailOptions::default()
            .with_poll_interval(Duration::from_millis(5))
            .with_idle_timeout(Some(Duration::from_millis(300)))
    }

    #[test]
    fn test_reads_existing_rows_then_stops_when_idle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NAME,PRICE\nA,1\n\nB,2.5").unwrap();
        file.flush().unwrap();

        let rows: Vec<_> = PriceTail::spawn(file.path(), fast())
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(rows, vec![PriceUpdate::new("A", 1.0), PriceUpdate::new("B", 2.5)]);
    }

    #[test]
    fn test_quoted_names_match_the_batch_reader() {
        let content = "NAME,PRICE\n\"AAPL\",1\n\"BRK,A\",2\n";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();

        let tailed: Vec<_> = PriceTail::spawn(file.path(), fast())
            .unwrap()
            .map(Result::unwrap)
            .collect();
        let batch: Vec<_> = PriceReader::new(content.as_bytes())
            .map(Result::unwrap)
            .collect();
        assert_eq!(tailed, batch);
        assert_eq!(
            tailed,
            vec![PriceUpdate::new("AAPL", 1.0), PriceUpdate::new("BRK,A", 2.0)]
        );
    }

    #[test]
    fn test_follows_appended_rows_and_joins_partial_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "NAME,PRICE\nA,1\nB,").unwrap();
        file.flush().unwrap();

        let tail = PriceTail::spawn(file.path(), fast()).unwrap();
        let path = file.path().to_path_buf();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
            writeln!(f, "7\nC,9").unwrap();
        });

        let rows: Vec<_> = tail.map(Result::unwrap).collect();
        writer.join().unwrap();
        assert_eq!(
            rows,
            vec![
                PriceUpdate::new("A", 1.0),
                PriceUpdate::new("B", 7.0),
                PriceUpdate::new("C", 9.0),
            ]
        );
    }

    #[test]
    fn test_bad_header_ends_the_tail() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NAME,SHARES\nA,1").unwrap();
        file.flush().unwrap();

        let rows: Vec<_> = PriceTail::spawn(file.path(), fast()).unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0], Err(FeedError::Header { .. })));
    }

    #[test]
    fn test_bad_rows_are_reported_and_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NAME,PRICE\nA,oops\nB,2").unwrap();
        file.flush().unwrap();

        let rows: Vec<_> = PriceTail::spawn(file.path(), fast()).unwrap().collect();
        assert!(matches!(rows[0], Err(FeedError::Parse { line: 2, .. })));
        assert_eq!(rows[1], Ok(PriceUpdate::new("B", 2.0)));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PriceTail::spawn("/nonexistent/prices.csv", fast()),
            Err(FeedError::Io(_))
        ));
    }
}
