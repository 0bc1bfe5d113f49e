use serde::{Deserialize, Serialize};

/// Efficacy thresholds for one ingredient. Dosage files key these by ingredient name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosageRange {
    pub min: f64,
    pub optimal: f64,
    pub max: f64,
    pub unit: String,
}
