pub mod catalog;
pub mod cost;
pub mod dosage;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod units;
