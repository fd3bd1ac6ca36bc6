pub mod encoding;
pub mod error;
pub mod model;
pub mod parsing;

pub use encoding::{encode, encode_with_bounds, AgeBounds, FeatureVector, PersonRecord, Tier};
pub use error::TierError;
pub use model::{predict, train, EpochStats, Model, NeuralNet, Prediction, PredictionResult, TrainConfig};
pub use parsing::Dataset;
