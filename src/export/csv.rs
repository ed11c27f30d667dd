use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::format::{format_percent_change, format_price, format_short_number};
use crate::market_data::types::Listing;
use crate::metrics;

pub const EXPORT_FILE_NAME: &str = "cryptos.csv";
pub const HEADERS: [&str; 4] = ["Name", "Price (USD)", "Market Cap", "24h % Change"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Pre-formatted cells for one listing, in [`HEADERS`] order.
pub fn export_record(listing: &Listing) -> [String; 4] {
    let usd = listing.usd();
    [
        format!("{} ({})", listing.name, listing.symbol),
        format_price(usd.price),
        format_short_number(usd.market_cap),
        format_percent_change(usd.percent_change_24h),
    ]
}

pub fn write_csv<W: Write>(writer: W, rows: &[Listing]) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADERS)?;
    for row in rows {
        csv.write_record(export_record(row))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write `rows` to `<dir>/cryptos.csv`. An empty table is refused.
pub fn export_to_dir(dir: &Path, rows: &[Listing]) -> Result<PathBuf, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }
    let path = dir.join(EXPORT_FILE_NAME);
    write_csv(File::create(&path)?, rows)?;
    metrics::record_export(rows.len());
    Ok(path)
}
