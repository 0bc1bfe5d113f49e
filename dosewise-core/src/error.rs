use thiserror::Error;

#[derive(Debug, Error)]
pub enum DosewiseError {
    #[error("Unsupported mass unit '{0}' (expected one of mcg, mg, g, kg)")]
    UnsupportedUnit(String),

    #[error("No cost data for ingredient '{0}'")]
    MissingCost(String),

    #[error("No dosage range for ingredient '{0}'")]
    MissingDosage(String),

    #[error("Invalid offer for '{ingredient}': {reason}")]
    InvalidOffer { ingredient: String, reason: String },

    #[error("Invalid dosage range for '{ingredient}': {reason}")]
    InvalidDosageRange { ingredient: String, reason: String },

    #[error("Invalid product '{product}': {reason}")]
    InvalidProduct { product: String, reason: String },

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}
