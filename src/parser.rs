use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::board::{Person, PersonId};
use crate::config::Settings;
use crate::error::{AllocationError, Result};

pub const NAME_COLUMN: &str = "What is your name?";
pub const GROUP_SIZE_COLUMN: &str = "How many people are you requesting for?";
pub const PICKUP_COLUMN: &str = "Pickup point next to you?";
pub const OTHER_LOCATION_COLUMN: &str = "Other (Please Specify)";

/// Pickup answer meaning "use the free-text address instead"
pub const OTHER_PICKUP_SENTINEL: &str = "Other Addresses more than 1km from the above pickup points";

const MISSING: &str = "N/A";

/// Columns that must be present, in the order they are checked
pub fn required_columns(settings: &Settings) -> [&str; 5] {
    [
        NAME_COLUMN,
        GROUP_SIZE_COLUMN,
        PICKUP_COLUMN,
        OTHER_LOCATION_COLUMN,
        settings.priority_column.as_str(),
    ]
}

/// Reads a group size the way a lenient integer parse would: optional
/// leading whitespace and `+`, then digits. Anything else is 0.
fn parse_group_size(value: &str) -> u32 {
    let trimmed = value.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn field<'a>(row: &'a HashMap<String, String>, column: &str) -> Option<&'a str> {
    row.get(column).map(String::as_str).filter(|v| !v.is_empty())
}

/// Turns one parsed CSV row into a request
pub fn normalize_row(row: &HashMap<String, String>, index: usize, settings: &Settings) -> Person {
    let name = field(row, NAME_COLUMN).unwrap_or(MISSING);
    let pickup = field(row, PICKUP_COLUMN).unwrap_or(MISSING);
    let location = if pickup == OTHER_PICKUP_SENTINEL {
        field(row, OTHER_LOCATION_COLUMN).unwrap_or(MISSING)
    } else {
        pickup
    };
    let group_size = field(row, GROUP_SIZE_COLUMN)
        .map(parse_group_size)
        .unwrap_or(0);
    let priority = row
        .get(&settings.priority_column)
        .is_some_and(|v| *v == settings.priority_marker);

    Person {
        id: PersonId(index),
        name: name.to_string(),
        location: location.to_string(),
        group_size,
        priority,
    }
}

/// Parses a whole form export. Fails without returning any rows when a
/// required column is absent or there are no data rows.
pub fn load_requests_from_reader<R: Read>(source: R, settings: &Settings) -> Result<Vec<Person>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    if let Some(missing) = required_columns(settings)
        .into_iter()
        .find(|col| !headers.iter().any(|h| h == col))
    {
        warn!(column = missing, "upload rejected: missing column");
        return Err(AllocationError::MissingColumn(missing.to_string()));
    }

    let mut persons = Vec::new();
    for result in reader.records() {
        let record = result?;

        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        persons.push(normalize_row(&row, persons.len(), settings));
    }

    if persons.is_empty() {
        warn!("upload rejected: no data rows");
        return Err(AllocationError::NoRows);
    }

    info!(requests = persons.len(), "parsed transport requests");
    Ok(persons)
}

pub fn load_requests_from_bytes(bytes: &[u8], settings: &Settings) -> Result<Vec<Person>> {
    load_requests_from_reader(bytes, settings)
}

pub fn load_requests<P: AsRef<Path>>(csv_path: P, settings: &Settings) -> Result<Vec<Person>> {
    let file = File::open(csv_path)?;
    load_requests_from_reader(file, settings)
}
