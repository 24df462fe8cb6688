//! Calendar arithmetic on stored dates

use chrono::{Months, NaiveDate};

use crate::StorageError;

/// Format of every `date` column in the dataset
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Shift a `YYYY-MM-DD` date back by one calendar year.
///
/// Month and day are kept; 29 February lands on 28 February.
pub fn one_year_before(date: &str) -> Result<String, StorageError> {
    let parsed = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| StorageError::InvalidDate(date.to_string()))?;

    let shifted = parsed
        .checked_sub_months(Months::new(12))
        .ok_or_else(|| StorageError::InvalidDate(date.to_string()))?;

    Ok(shifted.format(DATE_FORMAT).to_string())
}
