//! Market cost inference from single-ingredient offers.

use crate::{
    catalog::{normalize_name, Offer, OfferCatalog},
    error::DosewiseError,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferredCost {
    pub ingredient_name: String,
    pub cost_per_mg: f64,
    /// Number of offers that went into the average.
    pub sample_size: usize,
}

/// Quantity-weighted average cost per mg across `offers`.
///
/// Each offer's unit cost is weighted by its quantity, so bulk listings pull
/// the result toward their price more than small ones do. This is
/// `sum(unit_cost_i * qty_i) / sum(qty_i)`, not the mean of the unit costs.
///
/// # Errors
///
/// `MissingCost` when `offers` is empty, `InvalidOffer` when an offer has a
/// non-positive quantity or a negative cost.
pub fn infer_cost_per_mg(ingredient_name: &str, offers: &[Offer]) -> Result<f64, DosewiseError> {
    if offers.is_empty() {
        return Err(DosewiseError::MissingCost(ingredient_name.to_string()));
    }

    let mut weighted_cost = 0.0;
    let mut total_quantity_mg = 0.0;
    for offer in offers {
        if !offer.quantity_mg.is_finite() || offer.quantity_mg <= 0.0 {
            return Err(DosewiseError::InvalidOffer {
                ingredient: ingredient_name.to_string(),
                reason: format!("quantity must be positive, got {} mg", offer.quantity_mg),
            });
        }
        if !offer.cost.is_finite() || offer.cost < 0.0 {
            return Err(DosewiseError::InvalidOffer {
                ingredient: ingredient_name.to_string(),
                reason: format!("cost must be non-negative, got {}", offer.cost),
            });
        }
        weighted_cost += offer.cost_per_mg() * offer.quantity_mg;
        total_quantity_mg += offer.quantity_mg;
    }

    Ok(weighted_cost / total_quantity_mg)
}

/// Inferred cost per mg for every ingredient in an offer catalog.
///
/// Built once per catalog and shared across product evaluations.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    costs: HashMap<String, InferredCost>,
}

impl CostTable {
    pub fn infer(catalog: &OfferCatalog) -> Self {
        let mut costs = HashMap::new();
        for (key, offers) in catalog.groups() {
            let display_name = offers
                .first()
                .map_or_else(|| key.clone(), |o| o.ingredient_name.clone());
            match infer_cost_per_mg(&display_name, offers) {
                Ok(cost_per_mg) => {
                    debug!(
                        ingredient = %display_name,
                        cost_per_mg,
                        samples = offers.len(),
                        "Inferred ingredient cost"
                    );
                    costs.insert(
                        key.clone(),
                        InferredCost {
                            ingredient_name: display_name,
                            cost_per_mg,
                            sample_size: offers.len(),
                        },
                    );
                }
                Err(e) => warn!(ingredient = %display_name, error = %e, "Could not infer cost"),
            }
        }
        Self { costs }
    }

    pub fn get(&self, ingredient_name: &str) -> Option<&InferredCost> {
        self.costs.get(&normalize_name(ingredient_name))
    }

    pub fn lookup(&self, ingredient_name: &str) -> Result<&InferredCost, DosewiseError> {
        self.get(ingredient_name)
            .ok_or_else(|| DosewiseError::MissingCost(ingredient_name.to_string()))
    }

    /// Entries sorted by ingredient name.
    pub fn sorted(&self) -> Vec<&InferredCost> {
        let mut entries: Vec<_> = self.costs.values().collect();
        entries.sort_by(|a, b| a.ingredient_name.cmp(&b.ingredient_name));
        entries
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}
