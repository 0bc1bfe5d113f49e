use serde::{Deserialize, Serialize};

/// One observed single-ingredient market listing, as it appears in an offers file.
///
/// `unit` is the raw unit string from the listing; it is parsed and converted
/// to milligrams when the offer catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientOffer {
    pub ingredient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub cost: f64,
    pub total_quantity: f64,
    pub unit: String,
}
