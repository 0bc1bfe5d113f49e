//! Joins inferred costs and dosage scores into per-ingredient value
//! contributions and a product-level cost-effectiveness score.

use crate::{
    catalog::{normalize_name, DosageCatalog, OfferCatalog},
    cost::CostTable,
    error::DosewiseError,
    units::MassUnit,
};
use dosewise_schemas::product::Product;
use serde::Serialize;
use std::{collections::HashSet, fmt};
use tracing::{debug, warn};

/// Why an ingredient was left out of the value total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingCost,
    MissingDosage,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::MissingCost => "missing_cost",
            SkipReason::MissingDosage => "missing_dosage",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientEvaluation {
    pub name: String,
    pub amount_mg: f64,
    pub dosage_score: Option<f64>,
    pub dosage_reason: Option<String>,
    pub cost_per_mg: Option<f64>,
    pub value_contribution: Option<f64>,
    pub skip_reason: Option<SkipReason>,
}

impl IngredientEvaluation {
    fn skipped(name: &str, amount_mg: f64, reason: SkipReason) -> Self {
        Self {
            name: name.to_string(),
            amount_mg,
            dosage_score: None,
            dosage_reason: None,
            cost_per_mg: None,
            value_contribution: None,
            skip_reason: Some(reason),
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.skip_reason.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductEvaluation {
    pub product: String,
    pub cost_per_serving: f64,
    pub total_theoretical_value: f64,
    pub cost_effectiveness_score: f64,
    pub ingredient_evaluations: Vec<IngredientEvaluation>,
    pub analyzed_count: usize,
    pub total_count: usize,
}

impl ProductEvaluation {
    /// True when no ingredient had both cost and dosage data; the score is then 0.
    pub fn no_ingredients_analyzed(&self) -> bool {
        self.analyzed_count == 0
    }

    pub fn analyzed(&self) -> impl Iterator<Item = &IngredientEvaluation> {
        self.ingredient_evaluations.iter().filter(|e| e.is_analyzed())
    }

    pub fn skipped(&self, reason: SkipReason) -> impl Iterator<Item = &IngredientEvaluation> {
        self.ingredient_evaluations
            .iter()
            .filter(move |e| e.skip_reason == Some(reason))
    }
}

/// Checks the whole-product invariants that make an evaluation meaningful.
fn validate_product(product: &Product) -> Result<(), DosewiseError> {
    let invalid = |reason: String| DosewiseError::InvalidProduct {
        product: product.name.clone(),
        reason,
    };
    if product.servings == 0 {
        return Err(invalid("servings must be at least 1".to_string()));
    }
    if !product.cost.is_finite() || product.cost <= 0.0 {
        return Err(invalid(format!("cost must be positive, got {}", product.cost)));
    }
    if let Some(dose) = product
        .ingredients
        .iter()
        .find(|d| !d.amount.is_finite() || d.amount <= 0.0)
    {
        return Err(invalid(format!(
            "ingredient '{}' has non-positive amount {}",
            dose.name, dose.amount
        )));
    }
    Ok(())
}

/// Evaluates `product` against an already-inferred cost table.
///
/// With `filter` set, only the named ingredients are evaluated; the rest are
/// left out of `ingredient_evaluations` but still count toward `total_count`.
/// An empty filter, or one holding only blank names, evaluates everything.
///
/// # Errors
///
/// `InvalidProduct` for non-positive cost, zero servings or a non-positive
/// ingredient amount, and `UnsupportedUnit` for an ingredient unit outside
/// mcg/mg/g/kg. Missing cost or dosage data is never an error here.
pub fn evaluate_with(
    product: &Product,
    costs: &CostTable,
    dosages: &DosageCatalog,
    filter: Option<&[String]>,
) -> Result<ProductEvaluation, DosewiseError> {
    validate_product(product)?;
    let cost_per_serving = product.cost_per_serving();
    // A filter naming nothing selects everything.
    let wanted: Option<HashSet<String>> = filter
        .map(|names| {
            names
                .iter()
                .map(|n| normalize_name(n))
                .filter(|n| !n.is_empty())
                .collect::<HashSet<_>>()
        })
        .filter(|set| !set.is_empty());

    let mut ingredient_evaluations = Vec::with_capacity(product.ingredients.len());
    let mut total_theoretical_value = 0.0;
    let mut analyzed_count = 0;

    for dose in &product.ingredients {
        if let Some(wanted) = &wanted {
            if !wanted.contains(&normalize_name(&dose.name)) {
                continue;
            }
        }
        let amount_mg = dose.unit.parse::<MassUnit>()?.to_mg(dose.amount);

        let Some(cost) = costs.get(&dose.name) else {
            ingredient_evaluations.push(IngredientEvaluation::skipped(
                &dose.name,
                amount_mg,
                SkipReason::MissingCost,
            ));
            continue;
        };
        let dosage = match dosages.score(&dose.name, amount_mg) {
            Ok(dosage) => dosage,
            Err(_) => {
                ingredient_evaluations.push(IngredientEvaluation::skipped(
                    &dose.name,
                    amount_mg,
                    SkipReason::MissingDosage,
                ));
                continue;
            }
        };

        let value_contribution = cost.cost_per_mg * amount_mg * dosage.score;
        total_theoretical_value += value_contribution;
        analyzed_count += 1;
        ingredient_evaluations.push(IngredientEvaluation {
            name: dose.name.clone(),
            amount_mg,
            dosage_score: Some(dosage.score),
            dosage_reason: Some(dosage.reason),
            cost_per_mg: Some(cost.cost_per_mg),
            value_contribution: Some(value_contribution),
            skip_reason: None,
        });
    }

    let cost_effectiveness_score = if analyzed_count == 0 {
        warn!(product = %product.name, "No ingredients analyzed");
        0.0
    } else {
        total_theoretical_value / cost_per_serving
    };
    debug!(
        product = %product.name,
        analyzed = analyzed_count,
        total = product.ingredients.len(),
        score = cost_effectiveness_score,
        "Evaluated product"
    );

    Ok(ProductEvaluation {
        product: product.name.clone(),
        cost_per_serving,
        total_theoretical_value,
        cost_effectiveness_score,
        ingredient_evaluations,
        analyzed_count,
        total_count: product.ingredients.len(),
    })
}

/// One-shot evaluation straight from the catalogs.
///
/// Infers the cost table on every call; use [`Evaluator`] when evaluating
/// several products against the same catalogs.
pub fn evaluate(
    product: &Product,
    offers: &OfferCatalog,
    dosages: &DosageCatalog,
) -> Result<ProductEvaluation, DosewiseError> {
    evaluate_with(product, &CostTable::infer(offers), dosages, None)
}

/// Evaluates products against a cost table inferred once up front.
pub struct Evaluator {
    costs: CostTable,
    dosages: DosageCatalog,
}

impl Evaluator {
    pub fn new(offers: &OfferCatalog, dosages: DosageCatalog) -> Self {
        Self::from_parts(CostTable::infer(offers), dosages)
    }

    pub fn from_parts(costs: CostTable, dosages: DosageCatalog) -> Self {
        Self { costs, dosages }
    }

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    pub fn dosages(&self) -> &DosageCatalog {
        &self.dosages
    }

    pub fn evaluate(&self, product: &Product) -> Result<ProductEvaluation, DosewiseError> {
        evaluate_with(product, &self.costs, &self.dosages, None)
    }

    pub fn evaluate_filtered(
        &self,
        product: &Product,
        filter: Option<&[String]>,
    ) -> Result<ProductEvaluation, DosewiseError> {
        evaluate_with(product, &self.costs, &self.dosages, filter)
    }

    /// Evaluates every product; a failed product does not stop the others.
    pub fn evaluate_all(
        &self,
        products: &[Product],
    ) -> Vec<Result<ProductEvaluation, DosewiseError>> {
        products
            .iter()
            .map(|product| {
                self.evaluate(product).map_err(|e| {
                    warn!(product = %product.name, error = %e, "Product evaluation failed");
                    e
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosewise_schemas::{dosage::DosageRange, offer::IngredientOffer, product::IngredientDose};

    fn dose(name: &str, amount: f64, unit: &str) -> IngredientDose {
        IngredientDose {
            name: name.to_string(),
            amount,
            unit: unit.to_string(),
        }
    }

    fn pre_workout() -> Product {
        Product {
            name: "Example Pre-Workout".to_string(),
            cost: 39.99,
            servings: 30,
            ingredients: vec![
                dose("Caffeine Anhydrous", 200.0, "mg"),
                dose("Beta-Alanine", 3.2, "g"),
                dose("Creatine Monohydrate", 5.0, "g"),
            ],
        }
    }

    fn evaluator() -> Evaluator {
        let offers = vec![
            IngredientOffer {
                ingredient_name: "Caffeine Anhydrous".to_string(),
                product_name: None,
                cost: 10.0,
                total_quantity: 20.0,
                unit: "g".to_string(),
            },
            IngredientOffer {
                ingredient_name: "Beta-Alanine".to_string(),
                product_name: None,
                cost: 20.0,
                total_quantity: 500.0,
                unit: "g".to_string(),
            },
        ];
        let mut dosages = DosageCatalog::new();
        for (name, min, optimal, max) in [
            ("Caffeine Anhydrous", 100.0, 200.0, 400.0),
            ("Creatine Monohydrate", 3000.0, 5000.0, 10000.0),
        ] {
            dosages
                .add(
                    name,
                    &DosageRange {
                        min,
                        optimal,
                        max,
                        unit: "mg".to_string(),
                    },
                )
                .unwrap();
        }
        Evaluator::new(&OfferCatalog::from_offers(&offers), dosages)
    }

    #[test]
    fn tags_each_kind_of_missing_data() {
        let eval = evaluator().evaluate(&pre_workout()).unwrap();

        assert_eq!(eval.total_count, 3);
        assert_eq!(eval.analyzed_count, 1);
        let reasons: Vec<_> = eval.ingredient_evaluations.iter().map(|e| e.skip_reason).collect();
        assert_eq!(
            reasons,
            vec![None, Some(SkipReason::MissingDosage), Some(SkipReason::MissingCost)]
        );

        let creatine = &eval.ingredient_evaluations[2];
        assert_eq!(creatine.amount_mg, 5000.0);
        assert!(creatine.value_contribution.is_none());
        assert!(creatine.dosage_score.is_none());
    }

    #[test]
    fn skipped_ingredients_do_not_add_value() {
        let eval = evaluator().evaluate(&pre_workout()).unwrap();
        let caffeine = &eval.ingredient_evaluations[0];

        assert_eq!(caffeine.dosage_score, Some(1.0));
        assert!((caffeine.value_contribution.unwrap() - 0.1).abs() < 1e-12);
        assert!((eval.total_theoretical_value - 0.1).abs() < 1e-12);
        assert!((eval.cost_effectiveness_score - 0.1 / (39.99 / 30.0)).abs() < 1e-12);
    }

    #[test]
    fn nothing_analyzable_scores_zero() {
        let product = Product {
            name: "Mystery Blend".to_string(),
            cost: 25.0,
            servings: 20,
            ingredients: vec![dose("Taurine", 1.0, "g"), dose("Beta-Alanine", 1.6, "g")],
        };
        let eval = evaluator().evaluate(&product).unwrap();

        assert!(eval.no_ingredients_analyzed());
        assert_eq!(eval.cost_effectiveness_score, 0.0);
        assert_eq!(eval.total_theoretical_value, 0.0);
        assert_eq!(eval.skipped(SkipReason::MissingCost).count(), 1);
        assert_eq!(eval.skipped(SkipReason::MissingDosage).count(), 1);
    }

    #[test]
    fn filter_limits_evaluated_ingredients() {
        let filter = vec!["caffeine anhydrous".to_string()];
        let eval = evaluator()
            .evaluate_filtered(&pre_workout(), Some(&filter))
            .unwrap();

        assert_eq!(eval.ingredient_evaluations.len(), 1);
        assert_eq!(eval.ingredient_evaluations[0].name, "Caffeine Anhydrous");
        assert_eq!(eval.analyzed_count, 1);
        assert_eq!(eval.total_count, 3);
    }

    #[test]
    fn empty_filter_evaluates_every_ingredient() {
        let evaluator = evaluator();
        let blank = vec![String::new(), "  ".to_string()];
        for filter in [&[][..], &blank[..]] {
            let eval = evaluator
                .evaluate_filtered(&pre_workout(), Some(filter))
                .unwrap();
            assert_eq!(eval.ingredient_evaluations.len(), 3);
            assert_eq!(eval.total_count, 3);
        }
    }

    #[test]
    fn rejects_structurally_invalid_products() {
        let evaluator = evaluator();

        let mut no_servings = pre_workout();
        no_servings.servings = 0;
        assert!(matches!(
            evaluator.evaluate(&no_servings),
            Err(DosewiseError::InvalidProduct { .. })
        ));

        let mut free = pre_workout();
        free.cost = 0.0;
        assert!(matches!(
            evaluator.evaluate(&free),
            Err(DosewiseError::InvalidProduct { .. })
        ));

        let mut bad_unit = pre_workout();
        bad_unit.ingredients.push(dose("Taurine", 1.0, "oz"));
        assert!(matches!(
            evaluator.evaluate(&bad_unit),
            Err(DosewiseError::UnsupportedUnit(_))
        ));
    }

    #[test]
    fn batch_continues_past_failures() {
        let mut broken = pre_workout();
        broken.servings = 0;
        let results = evaluator().evaluate_all(&[broken, pre_workout()]);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().analyzed_count, 1);
    }

    #[test]
    fn one_shot_matches_memoized_evaluator() {
        let offers = vec![IngredientOffer {
            ingredient_name: "Caffeine Anhydrous".to_string(),
            product_name: None,
            cost: 10.0,
            total_quantity: 20.0,
            unit: "g".to_string(),
        }];
        let catalog = OfferCatalog::from_offers(&offers);
        let mut dosages = DosageCatalog::new();
        dosages
            .add(
                "Caffeine Anhydrous",
                &DosageRange {
                    min: 100.0,
                    optimal: 200.0,
                    max: 400.0,
                    unit: "mg".to_string(),
                },
            )
            .unwrap();

        let one_shot = evaluate(&pre_workout(), &catalog, &dosages).unwrap();
        let memoized = Evaluator::new(&catalog, dosages).evaluate(&pre_workout()).unwrap();
        assert_eq!(one_shot, memoized);
    }
}
