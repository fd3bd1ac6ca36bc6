use std::fs;

use json::JsonValue;

use super::Dataset;
use crate::error::TierError;

/// Parse a JSON file holding already-encoded tables:
/// `{"features": [[7 numbers], ...], "labels": [[3 numbers], ...]}`
pub fn parse_dataset(path: &str) -> Result<Dataset, TierError> {
    let contents = fs::read_to_string(path)?;

    parse_str(&contents)
}

pub fn parse_str(contents: &str) -> Result<Dataset, TierError> {
    let document = json::parse(contents)?;
    let features = parse_rows(&document["features"], "features")?;
    let labels = parse_rows(&document["labels"], "labels")?;

    Dataset::from_rows(&features, &labels)
}

/// Read an array of numeric arrays. Width is checked later by `Dataset::from_rows`.
fn parse_rows(value: &JsonValue, key: &str) -> Result<Vec<Vec<f64>>, TierError> {
    if !value.is_array() {
        return Err(malformed(format!("\"{}\" must be an array of rows", key)));
    }

    value
        .members()
        .enumerate()
        .map(|(row, members)| {
            if !members.is_array() {
                return Err(malformed(format!("{} row {} is not an array", key, row)));
            }

            members
                .members()
                .map(|x| {
                    x.as_f64()
                        .ok_or_else(|| malformed(format!("{} row {} has a non-numeric value", key, row)))
                })
                .collect()
        })
        .collect()
}

fn malformed(message: String) -> TierError {
    TierError::Json(json::Error::WrongType(message))
}
