//! Prediction Module
//!
//! First-order model of which resource tends to be accessed after which.

mod predictor;

pub use predictor::{AccessPredictor, Prediction, PredictorConfig};
