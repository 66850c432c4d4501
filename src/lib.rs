//! Water potability prediction service.
//!
//! Loads one pre-trained classifier at startup and serves `POST /predict`,
//! mapping a JSON feature vector to an integer class label.

pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod routes;

pub use config::ServerConfig;
pub use error::{ApiError, ModelError};
pub use inference::{Classifier, ModelInference};
