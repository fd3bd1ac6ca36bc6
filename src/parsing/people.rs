use std::fs::File;
use std::io::Read;

use ndarray::Array;
use serde::Deserialize;

use super::Dataset;
use crate::encoding::{encode_record, AgeBounds, PersonRecord, Tier, NUM_CLASSES, NUM_FEATURES};
use crate::error::TierError;

/// One labeled person, stored as `name,age,color,location,tier`
#[derive(Debug, Deserialize)]
struct LabeledPerson {
    name: String,
    age: u32,
    color: String,
    location: String,
    tier: String,
}

impl LabeledPerson {
    fn split(self) -> (PersonRecord, String) {
        let person = PersonRecord {
            name: self.name,
            age: self.age,
            color: self.color,
            location: self.location,
        };

        (person, self.tier)
    }
}

/// Parse a people CSV file into an encoded dataset
pub fn parse_dataset(path: &str, bounds: AgeBounds) -> Result<Dataset, TierError> {
    let file = File::open(path)?;

    parse_reader(file, bounds)
}

/// Parse people CSV records (with a header line) from any reader
pub fn parse_reader<R: Read>(reader: R, bounds: AgeBounds) -> Result<Dataset, TierError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut data = Array::zeros((0, NUM_FEATURES));
    let mut target = Array::zeros((0, NUM_CLASSES));

    for record in csv_reader.deserialize() {
        let row: LabeledPerson = record?;
        let (person, tier) = row.split();
        let features = encode_record(&person, bounds)?;
        let tier = tier.parse::<Tier>()?;

        data.push_row(features.view())?;
        target.push_row(tier.one_hot().view())?;
    }

    let dataset = Dataset { data, target };
    dataset.validate()?;

    Ok(dataset)
}
