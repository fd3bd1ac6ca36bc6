use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use serde::Deserialize;

use crate::error::TierError;

/// Width of an encoded person: [age, blue, red, green, são paulo, rio, curitiba]
pub const NUM_FEATURES: usize = 7;
/// Number of tiers the classifier scores
pub const NUM_CLASSES: usize = 3;

const COLOR_OFFSET: usize = 1;
const LOCATION_OFFSET: usize = 4;

pub type FeatureVector = Array1<f64>;

/// The tiers a person can be classified into.
/// The order of `Tier::ALL` is the column order of every label vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Premium,
    Medium,
    Basic,
}

impl Tier {
    pub const ALL: [Tier; NUM_CLASSES] = [Tier::Premium, Tier::Medium, Tier::Basic];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Premium => "premium",
            Tier::Medium => "medium",
            Tier::Basic => "basic",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tier::Premium => 0,
            Tier::Medium => 1,
            Tier::Basic => 2,
        }
    }

    /// One-hot label vector for this tier
    pub fn one_hot(&self) -> Array1<f64> {
        (0..NUM_CLASSES)
            .map(|idx| if idx == self.index() { 1f64 } else { 0f64 })
            .collect()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "premium" => Ok(Tier::Premium),
            "medium" => Ok(Tier::Medium),
            "basic" => Ok(Tier::Basic),
            _ => Err(TierError::UnknownTier(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Blue,
    Red,
    Green,
}

impl Color {
    fn slot(&self) -> usize {
        COLOR_OFFSET
            + match self {
                Color::Blue => 0,
                Color::Red => 1,
                Color::Green => 2,
            }
    }
}

impl FromStr for Color {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blue" => Ok(Color::Blue),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            _ => Err(TierError::Encoding {
                field: "color",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    SaoPaulo,
    Rio,
    Curitiba,
}

impl Location {
    fn slot(&self) -> usize {
        LOCATION_OFFSET
            + match self {
                Location::SaoPaulo => 0,
                Location::Rio => 1,
                Location::Curitiba => 2,
            }
    }
}

impl FromStr for Location {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "são paulo" | "sao paulo" => Ok(Location::SaoPaulo),
            "rio" => Ok(Location::Rio),
            "curitiba" => Ok(Location::Curitiba),
            _ => Err(TierError::Encoding {
                field: "location",
                value: s.to_string(),
            }),
        }
    }
}

/// Range used to scale ages into the first feature slot.
/// Ages outside the range are not clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgeBounds {
    min: f64,
    max: f64,
}

impl AgeBounds {
    pub fn new(min: f64, max: f64) -> Result<AgeBounds, TierError> {
        // Also rejects NaN and infinite bounds
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(TierError::InvalidAgeBounds { min, max });
        }

        Ok(AgeBounds { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn normalize(&self, age: f64) -> f64 {
        (age - self.min) / (self.max - self.min)
    }
}

impl Default for AgeBounds {
    fn default() -> Self {
        AgeBounds { min: 0.0, max: 100.0 }
    }
}

/// A person as given by the caller. The name is carried along but never encoded.
#[derive(Clone, Debug, Deserialize)]
pub struct PersonRecord {
    #[serde(default)]
    pub name: String,
    pub age: u32,
    pub color: String,
    pub location: String,
}

/// Encode an age, color and location with the default age bounds
pub fn encode(age: f64, color: &str, location: &str) -> Result<FeatureVector, TierError> {
    encode_with_bounds(age, color, location, AgeBounds::default())
}

pub fn encode_with_bounds(
    age: f64,
    color: &str,
    location: &str,
    bounds: AgeBounds,
) -> Result<FeatureVector, TierError> {
    if !age.is_finite() {
        return Err(TierError::NonFiniteAge(age));
    }
    let color = color.parse::<Color>()?;
    let location = location.parse::<Location>()?;

    Ok(encode_parts(age, color, location, bounds))
}

/// Encode already-parsed categories. Cannot fail since both enums are closed.
pub fn encode_parts(age: f64, color: Color, location: Location, bounds: AgeBounds) -> FeatureVector {
    let mut features = Array1::zeros(NUM_FEATURES);

    features[0] = bounds.normalize(age);
    features[color.slot()] = 1f64;
    features[location.slot()] = 1f64;

    features
}

pub fn encode_record(record: &PersonRecord, bounds: AgeBounds) -> Result<FeatureVector, TierError> {
    encode_with_bounds(record.age as f64, &record.color, &record.location, bounds)
}
