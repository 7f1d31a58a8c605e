//! CSV template export

use crate::errors::ImportError;
use crate::parser::DELIMITER;
use csv::WriterBuilder;

/// File name offered to the browser
pub const TEMPLATE_FILENAME: &str = "beans_template.csv";

/// Import columns, in template order
pub const CSV_HEADERS: [&str; 8] = [
    "coffee_name",
    "country",
    "processing",
    "roaster",
    "roasting_date",
    "rating",
    "variety",
    "tasting_notes",
];

/// A template file: the header row and nothing else
pub fn csv_template() -> Result<String, ImportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| ImportError::Write(e.to_string()))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::Write(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| ImportError::Write(e.to_string()))
}
