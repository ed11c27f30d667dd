pub mod csv;
pub mod format;

pub use self::csv::{EXPORT_FILE_NAME, ExportError, export_to_dir, write_csv};
pub use format::{format_percent_change, format_price, format_short_number};
