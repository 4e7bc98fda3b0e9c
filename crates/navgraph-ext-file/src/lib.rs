//! # Navgraph Ext File
//!
//! File-based inputs and outputs for the Navgraph valuation graph.
//!
//! - [`StructureReader`]: block-structured `NAME,SHARES` structure files
//! - [`PriceReader`]: `NAME,PRICE` price files
//! - [`CsvPriceWriter`]: a [`PriceSink`](navgraph_core::PriceSink) writing
//!   `NAME,PRICE` rows
//! - [`PriceTail`]: follows a growing price file, yielding rows as they are
//!   completed

#![warn(missing_docs)]
#![warn(clippy::all)]

mod prices;
mod rows;
mod structure;
mod tail;

pub use prices::{read_prices, CsvPriceWriter, PriceReader, PRICE_HEADER};
pub use structure::{read_structure, StructureReader, STRUCTURE_HEADER};
pub use tail::{PriceTail, TailOptions};
