//! Output formatting utilities.

use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use navgraph_config::OutputSettings;
use navgraph_core::{ComponentKind, FeedResult, PriceEvent, PriceSink};
use navgraph_engine::ComponentState;

use crate::cli::OutputFormat;

/// Formats and prints output based on the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(data),
        OutputFormat::Json => print_json(data),
        OutputFormat::Csv => print_csv(data),
        OutputFormat::Minimal => print_minimal(data),
    }
}

/// Prints data as a formatted table.
fn print_table<T: Tabled>(data: &[T]) -> anyhow::Result<()> {
    if data.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let table = Table::new(data)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string();

    println!("{}", table);
    Ok(())
}

/// Prints data as JSON.
pub fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Prints data as CSV.
fn print_csv<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(io::stdout());
    for item in data {
        wtr.serialize(item)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Prints one compact JSON line per item.
fn print_minimal<T: Serialize>(data: &[T]) -> anyhow::Result<()> {
    for item in data {
        println!("{}", serde_json::to_string(item)?);
    }
    Ok(())
}

/// Writes bare `name,price` records, quoting names that contain delimiters.
fn write_name_prices<'a, W: Write>(
    out: W,
    rows: impl IntoIterator<Item = (&'a str, String)>,
) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    for (name, price) in rows {
        wtr.write_record([name, price.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Formats a price with a fixed number of decimals.
pub fn format_price(value: f64, precision: usize) -> String {
    format!("{:.prec$}", value, prec = precision)
}

// =============================================================================
// PRICE ROWS
// =============================================================================

/// One component price for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PriceRow {
    #[tabled(rename = "Component")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Price")]
    pub price: String,
}

impl PriceRow {
    fn new(name: &str, kind: ComponentKind, price: Option<f64>, precision: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            price: price.map_or_else(|| "-".to_string(), |p| format_price(p, precision)),
        }
    }
}

/// Prints price events, dropping stock events when the settings ask for it.
pub fn print_events(
    events: &[PriceEvent],
    format: OutputFormat,
    settings: &OutputSettings,
) -> anyhow::Result<()> {
    let shown: Vec<&PriceEvent> = events
        .iter()
        .filter(|e| settings.include_stocks || e.kind != ComponentKind::Stock)
        .collect();

    match format {
        OutputFormat::Json => print_json(&shown),
        OutputFormat::Minimal => {
            let rows = shown
                .iter()
                .map(|e| (e.name.as_str(), format_price(e.price, settings.precision)));
            Ok(write_name_prices(io::stdout().lock(), rows)?)
        }
        OutputFormat::Table | OutputFormat::Csv => {
            let rows: Vec<_> = shown
                .iter()
                .map(|e| PriceRow::new(e.name.as_str(), e.kind, Some(e.price), settings.precision))
                .collect();
            print_output(&rows, format)
        }
    }
}

/// Prints the final state of every component.
pub fn print_snapshot(
    states: &[ComponentState],
    format: OutputFormat,
    settings: &OutputSettings,
) -> anyhow::Result<()> {
    let shown: Vec<&ComponentState> = states
        .iter()
        .filter(|s| settings.include_stocks || s.kind != ComponentKind::Stock)
        .collect();

    match format {
        OutputFormat::Json => print_json(&shown),
        OutputFormat::Minimal => {
            let rows = shown.iter().filter_map(|s| {
                s.valuation
                    .price()
                    .map(|p| (s.name.as_str(), format_price(p, settings.precision)))
            });
            Ok(write_name_prices(io::stdout().lock(), rows)?)
        }
        OutputFormat::Table | OutputFormat::Csv => {
            let rows: Vec<_> = shown
                .iter()
                .map(|s| {
                    PriceRow::new(s.name.as_str(), s.kind, s.valuation.price(), settings.precision)
                })
                .collect();
            print_output(&rows, format)
        }
    }
}

// =============================================================================
// LIVE SINK
// =============================================================================

/// [`PriceSink`] that prints each event to stdout as soon as it arrives.
pub struct ConsoleSink {
    format: OutputFormat,
    precision: usize,
    include_stocks: bool,
    started: bool,
}

impl ConsoleSink {
    /// Creates a sink printing in `format`.
    pub fn new(format: OutputFormat, settings: &OutputSettings) -> Self {
        Self {
            format,
            precision: settings.precision,
            include_stocks: settings.include_stocks,
            started: false,
        }
    }
}

impl PriceSink for ConsoleSink {
    fn publish(&mut self, event: &PriceEvent) -> FeedResult<()> {
        if event.kind == ComponentKind::Stock && !self.include_stocks {
            return Ok(());
        }

        let mut out = io::stdout().lock();
        let price = format_price(event.price, self.precision);
        match self.format {
            OutputFormat::Csv | OutputFormat::Minimal => {
                if self.format == OutputFormat::Csv && !self.started {
                    writeln!(out, "NAME,PRICE")?;
                }
                write_name_prices(&mut out, [(event.name.as_str(), price)])
                    .map_err(|e| navgraph_core::FeedError::Io(e.to_string()))?;
            }
            OutputFormat::Json => {
                let line = serde_json::to_string(event)
                    .map_err(|e| navgraph_core::FeedError::Io(e.to_string()))?;
                writeln!(out, "{line}")?;
            }
            OutputFormat::Table => {
                let name = match event.kind {
                    ComponentKind::Stock => event.name.as_str().cyan(),
                    ComponentKind::Portfolio => event.name.as_str().bold(),
                };
                writeln!(out, "{:<24} {:>20}", name, price)?;
            }
        }
        self.started = true;
        out.flush()?;
        Ok(())
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Prints an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Prints a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// A key-value pair for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KeyValue {
    #[tabled(rename = "Setting")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

/// Prints a header for a section.
pub fn print_header(title: &str) {
    println!("\n{}", title.bold().underline());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(20.0, 2), "20.00");
        assert_eq!(format_price(1.0 / 3.0, 4), "0.3333");
    }

    #[test]
    fn test_price_row_marks_unpriced() {
        let row = PriceRow::new("P", ComponentKind::Portfolio, None, 6);
        assert_eq!(row.price, "-");
        assert_eq!(row.kind, "portfolio");
    }

    #[test]
    fn test_name_price_lines_quote_delimiters() {
        let mut buf = Vec::new();
        write_name_prices(
            &mut buf,
            [("AAPL", format_price(1.0, 2)), ("BRK,A", format_price(2.0, 2))],
        )
        .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "AAPL,1.00\n\"BRK,A\",2.00\n");
    }
}
