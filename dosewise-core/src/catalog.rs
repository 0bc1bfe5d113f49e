//! Validated, milligram-normalized lookup tables built from raw data records.
//!
//! Both catalogs key their entries by [`normalize_name`], and every lookup goes
//! through the same function, so "Beta-Alanine" and " beta-alanine" resolve to
//! the same entry. Records that fail validation are kept out of the catalog and
//! listed in `rejected`; one bad record never prevents the rest from loading.

use crate::{error::DosewiseError, units::MassUnit};
use dosewise_schemas::{dosage::DosageRange, offer::IngredientOffer};
use std::collections::HashMap;
use tracing::warn;

/// Canonical lookup key for an ingredient name: trimmed, single-spaced, lowercase.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A market offer with its quantity converted to milligrams.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub ingredient_name: String,
    pub product_name: Option<String>,
    pub cost: f64,
    pub quantity_mg: f64,
}

impl Offer {
    pub fn cost_per_mg(&self) -> f64 {
        self.cost / self.quantity_mg
    }
}

impl TryFrom<&IngredientOffer> for Offer {
    type Error = DosewiseError;

    fn try_from(raw: &IngredientOffer) -> Result<Self, Self::Error> {
        let invalid = |reason: String| DosewiseError::InvalidOffer {
            ingredient: raw.ingredient_name.clone(),
            reason,
        };

        if !raw.cost.is_finite() || raw.cost <= 0.0 {
            return Err(invalid(format!("cost must be positive, got {}", raw.cost)));
        }
        if !raw.total_quantity.is_finite() || raw.total_quantity <= 0.0 {
            return Err(invalid(format!(
                "total quantity must be positive, got {}",
                raw.total_quantity
            )));
        }
        let unit: MassUnit = raw.unit.parse()?;

        Ok(Offer {
            ingredient_name: raw.ingredient_name.trim().to_string(),
            product_name: raw.product_name.clone(),
            cost: raw.cost,
            quantity_mg: unit.to_mg(raw.total_quantity),
        })
    }
}

/// All accepted offers, grouped per ingredient.
#[derive(Debug, Default)]
pub struct OfferCatalog {
    offers: HashMap<String, Vec<Offer>>,
    pub rejected: Vec<DosewiseError>,
}

impl OfferCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from raw offers, skipping (and recording) invalid ones.
    pub fn from_offers<'a, I>(raw_offers: I) -> Self
    where
        I: IntoIterator<Item = &'a IngredientOffer>,
    {
        let mut catalog = Self::new();
        for raw in raw_offers {
            if let Err(e) = catalog.add(raw) {
                warn!(ingredient = %raw.ingredient_name, error = %e, "Rejected offer");
                catalog.rejected.push(e);
            }
        }
        catalog
    }

    pub fn add(&mut self, raw: &IngredientOffer) -> Result<(), DosewiseError> {
        let offer = Offer::try_from(raw)?;
        self.offers
            .entry(normalize_name(&offer.ingredient_name))
            .or_default()
            .push(offer);
        Ok(())
    }

    /// Offers for one ingredient; empty when the catalog has none.
    pub fn offers_for(&self, ingredient_name: &str) -> &[Offer] {
        self.offers
            .get(&normalize_name(ingredient_name))
            .map_or(&[], Vec::as_slice)
    }

    /// Iterates `(normalized key, offers)` pairs.
    pub fn groups(&self) -> impl Iterator<Item = (&String, &[Offer])> {
        self.offers.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn ingredient_count(&self) -> usize {
        self.offers.len()
    }

    pub fn offer_count(&self) -> usize {
        self.offers.values().map(Vec::len).sum()
    }
}

/// Dosage thresholds converted to milligrams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRange {
    pub min_mg: f64,
    pub optimal_mg: f64,
    pub max_mg: f64,
}

impl NormalizedRange {
    /// Checks `0 <= min <= optimal <= max` and finiteness.
    pub fn new(min_mg: f64, optimal_mg: f64, max_mg: f64) -> Result<Self, String> {
        if ![min_mg, optimal_mg, max_mg].iter().all(|v| v.is_finite()) {
            return Err("thresholds must be finite".to_string());
        }
        if min_mg < 0.0 {
            return Err(format!("minimum must be non-negative, got {min_mg}"));
        }
        if !(min_mg <= optimal_mg && optimal_mg <= max_mg) {
            return Err(format!(
                "expected min <= optimal <= max, got {min_mg}/{optimal_mg}/{max_mg} mg"
            ));
        }
        Ok(Self {
            min_mg,
            optimal_mg,
            max_mg,
        })
    }

    pub fn from_raw(ingredient: &str, raw: &DosageRange) -> Result<Self, DosewiseError> {
        let unit: MassUnit = raw.unit.parse()?;
        Self::new(unit.to_mg(raw.min), unit.to_mg(raw.optimal), unit.to_mg(raw.max)).map_err(
            |reason| DosewiseError::InvalidDosageRange {
                ingredient: ingredient.to_string(),
                reason,
            },
        )
    }
}

/// One dosage range per ingredient.
#[derive(Debug, Default)]
pub struct DosageCatalog {
    ranges: HashMap<String, NormalizedRange>,
    pub rejected: Vec<DosewiseError>,
}

impl DosageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ranges<'a, I>(raw_ranges: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a DosageRange)>,
    {
        let mut catalog = Self::new();
        for (name, raw) in raw_ranges {
            if let Err(e) = catalog.add(name, raw) {
                warn!(ingredient = %name, error = %e, "Rejected dosage range");
                catalog.rejected.push(e);
            }
        }
        catalog
    }

    pub fn add(&mut self, ingredient_name: &str, raw: &DosageRange) -> Result<(), DosewiseError> {
        let range = NormalizedRange::from_raw(ingredient_name, raw)?;
        if self
            .ranges
            .insert(normalize_name(ingredient_name), range)
            .is_some()
        {
            warn!(ingredient = %ingredient_name, "Duplicate dosage range, keeping the latest");
        }
        Ok(())
    }

    pub fn get(&self, ingredient_name: &str) -> Option<&NormalizedRange> {
        self.ranges.get(&normalize_name(ingredient_name))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
