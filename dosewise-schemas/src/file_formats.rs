use crate::{dosage::DosageRange, offer::IngredientOffer, product::Product};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct OfferFile {
    pub schema_version: String,
    pub offers: Vec<IngredientOffer>,
}

#[derive(Debug, Deserialize)]
pub struct DosageFile {
    pub schema_version: String,
    pub dosages: BTreeMap<String, DosageRange>,
}

#[derive(Debug, Deserialize)]
pub struct ProductFile {
    pub schema_version: String,
    pub products: Vec<Product>,
}
