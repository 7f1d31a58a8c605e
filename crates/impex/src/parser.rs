//! Row parsing and validation
//!
//! Turns `;`-delimited text into validated `NewCoffee` values. Nothing here
//! touches the database.

use crate::errors::{DateFormatError, ImportError};
use beans_common::db::NewCoffee;
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;

/// Column delimiter of import and template files
pub const DELIMITER: u8 = b';';

/// One raw row, matched to the header by column name.
/// Missing columns and empty cells are `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    coffee_name: Option<String>,
    country: Option<String>,
    processing: Option<String>,
    roaster: Option<String>,
    roasting_date: Option<String>,
    rating: Option<String>,
    variety: Option<String>,
    tasting_notes: Option<String>,
}

/// Parse a whole file. Rows are numbered from 1, the header excluded.
/// The first invalid row aborts parsing.
pub fn parse_csv(data: &[u8]) -> Result<Vec<NewCoffee>, ImportError> {
    let text = String::from_utf8_lossy(data);

    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut coffees = Vec::new();

    for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = index + 1;
        let record = record.map_err(|e| ImportError::Malformed {
            row,
            message: e.to_string(),
        })?;

        coffees.push(parse_row(record, row)?);
    }

    debug!(rows = coffees.len(), "CSV parsed");
    Ok(coffees)
}

fn parse_row(record: CsvRow, row: usize) -> Result<NewCoffee, ImportError> {
    let name = required(record.coffee_name, "coffee_name", row)?;
    let processing = required(record.processing, "processing", row)?;
    let roaster = required(record.roaster, "roaster", row)?;
    let roasting_date = required(record.roasting_date, "roasting_date", row)?;

    let roasting_date = parse_roasting_date(&roasting_date)
        .map_err(|source| ImportError::InvalidDate { row, source })?;

    Ok(NewCoffee {
        name,
        country: record.country.unwrap_or_default(),
        processing,
        roaster,
        roasting_date,
        rating: parse_rating(record.rating.as_deref(), row)?,
        variety: record.variety.filter(|v| !v.is_empty()),
        tasting_notes: get_tasting_notes(record.tasting_notes.as_deref()),
    })
}

fn required(value: Option<String>, field: &'static str, row: usize) -> Result<String, ImportError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ImportError::MissingField { field, row })
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_roasting_date(value: &str) -> Result<NaiveDate, DateFormatError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DateFormatError)
}

/// Empty means no rating; anything else must be a whole number from 1 to 5
pub fn parse_rating(value: Option<&str>, row: usize) -> Result<Option<i32>, ImportError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    match value.parse::<i32>() {
        Ok(rating) if (1..=5).contains(&rating) => Ok(Some(rating)),
        _ => Err(ImportError::InvalidRating { row }),
    }
}

/// Split a comma separated list into normalized note names:
/// spaces trimmed, lower-cased, first letter upper-cased, empties dropped.
pub fn get_tasting_notes(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|note| capitalize(&note.trim_matches(' ').to_lowercase()))
        .filter(|note| !note.is_empty())
        .collect()
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "coffee_name;country;processing;roaster;roasting_date;rating;variety;tasting_notes";

    #[test]
    fn test_get_tasting_notes() {
        assert_eq!(
            get_tasting_notes(Some("One, two,and three")),
            vec!["One", "Two", "And three"]
        );
        assert_eq!(get_tasting_notes(Some("")), Vec::<String>::new());
        assert_eq!(get_tasting_notes(None), Vec::<String>::new());
        assert_eq!(get_tasting_notes(Some("DARK CHOCOLATE,, ")), vec!["Dark chocolate"]);
    }

    #[test]
    fn test_parse_roasting_date() {
        assert_eq!(
            parse_roasting_date("2022-03-03").unwrap(),
            NaiveDate::from_ymd_opt(2022, 3, 3).unwrap()
        );
        assert_eq!(parse_roasting_date("2022.03.03"), Err(DateFormatError));
        assert_eq!(parse_roasting_date("03-03-2022"), Err(DateFormatError));
        assert_eq!(parse_roasting_date("2022-02-30"), Err(DateFormatError));
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(None, 1).unwrap(), None);
        assert_eq!(parse_rating(Some(""), 1).unwrap(), None);
        assert_eq!(parse_rating(Some("4"), 1).unwrap(), Some(4));

        for bad in ["0", "6", "four", "3.5"] {
            let err = parse_rating(Some(bad), 7).unwrap_err();
            assert_eq!(err.to_string(), "rating is invalid in row 7");
        }
    }

    #[test]
    fn test_parse_full_row() {
        let data = format!(
            "{}\nKochere;Ethiopia;Washed;Friedhats;2022-03-03;4;Heirloom;peach, Bergamot\n",
            HEADER
        );

        let coffees = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(coffees.len(), 1);

        let coffee = &coffees[0];
        assert_eq!(coffee.name, "Kochere");
        assert_eq!(coffee.country, "Ethiopia");
        assert_eq!(coffee.rating, Some(4));
        assert_eq!(coffee.variety.as_deref(), Some("Heirloom"));
        assert_eq!(coffee.tasting_notes, vec!["Peach", "Bergamot"]);
    }

    #[test]
    fn test_missing_columns_are_absent_values() {
        let data = "coffee_name;processing;roaster;roasting_date\nAlo;Natural;Friedhats;2022-01-01\n";

        let coffees = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(coffees[0].country, "");
        assert_eq!(coffees[0].rating, None);
        assert_eq!(coffees[0].variety, None);
        assert!(coffees[0].tasting_notes.is_empty());
    }

    #[test]
    fn test_required_fields_name_the_row() {
        let data = format!(
            "{}\nKochere;Ethiopia;Washed;Friedhats;2022-03-03;;;\n;Kenya;Washed;Friedhats;2022-03-03;;;\n",
            HEADER
        );
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "coffee_name is a required field in row 2");

        let data = format!("{}\nKochere;Ethiopia;Washed;;2022-03-03;;;\n", HEADER);
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "roaster is a required field in row 1");

        let data = format!("{}\nKochere;Ethiopia;Washed;Friedhats;;;;\n", HEADER);
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "roasting_date is a required field in row 1");
    }

    #[test]
    fn test_invalid_date_names_the_row() {
        let data = format!("{}\nKochere;Ethiopia;Washed;Friedhats;2022.03.03;;;\n", HEADER);
        let err = parse_csv(data.as_bytes()).unwrap_err();

        assert_eq!(err.to_string(), "roasting_date is invalid in row 1");
        assert!(matches!(err, ImportError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        assert!(parse_csv(HEADER.as_bytes()).unwrap().is_empty());
        assert!(parse_csv(b"").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut data = format!("{}\nKoch", HEADER).into_bytes();
        data.push(0xFF);
        data.extend_from_slice(b"re;Ethiopia;Washed;Friedhats;2022-03-03;;;\n");

        let coffees = parse_csv(&data).unwrap();
        assert_eq!(coffees[0].name, "Koch\u{FFFD}re");
    }
}
