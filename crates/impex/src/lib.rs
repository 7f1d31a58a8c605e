//! Beans import/export
//!
//! `;`-delimited CSV files in and out of a user's catalogue:
//! - `parser` validates rows without touching the database
//! - `importer` applies a parsed file in one transaction
//! - `template` produces the empty template users fill in

pub mod errors;
pub mod importer;
pub mod parser;
pub mod template;

pub use errors::{DateFormatError, ImportError};
pub use importer::{CsvImporter, ImportOutcome, ImportSummary};
pub use parser::{get_tasting_notes, parse_csv, parse_roasting_date};
pub use template::{csv_template, CSV_HEADERS, TEMPLATE_FILENAME};
