use crate::{
    error::DosewiseError,
    evaluation::{IngredientEvaluation, ProductEvaluation, SkipReason},
};
use csv::Writer;
use serde::Serialize;
use std::{fs, io};

/// One product-ingredient pair. Product columns repeat on every row.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    product: &'a str,
    cost_per_serving: f64,
    total_theoretical_value: f64,
    cost_effectiveness_score: f64,
    analyzed_count: usize,
    total_count: usize,
    ingredient: Option<&'a str>,
    amount_mg: Option<f64>,
    dosage_score: Option<f64>,
    dosage_reason: Option<&'a str>,
    cost_per_mg: Option<f64>,
    value_contribution: Option<f64>,
    skip_reason: Option<SkipReason>,
}

impl<'a> ExportRow<'a> {
    fn new(
        evaluation: &'a ProductEvaluation,
        ingredient: Option<&'a IngredientEvaluation>,
    ) -> Self {
        Self {
            product: &evaluation.product,
            cost_per_serving: evaluation.cost_per_serving,
            total_theoretical_value: evaluation.total_theoretical_value,
            cost_effectiveness_score: evaluation.cost_effectiveness_score,
            analyzed_count: evaluation.analyzed_count,
            total_count: evaluation.total_count,
            ingredient: ingredient.map(|i| i.name.as_str()),
            amount_mg: ingredient.map(|i| i.amount_mg),
            dosage_score: ingredient.and_then(|i| i.dosage_score),
            dosage_reason: ingredient.and_then(|i| i.dosage_reason.as_deref()),
            cost_per_mg: ingredient.and_then(|i| i.cost_per_mg),
            value_contribution: ingredient.and_then(|i| i.value_contribution),
            skip_reason: ingredient.and_then(|i| i.skip_reason),
        }
    }
}

/// Writes evaluations as a denormalized CSV table.
///
/// Skipped ingredients get a row too, with their `skip_reason` set and the
/// score, cost and value cells left empty. A product with no ingredient rows
/// still gets a single row with the ingredient columns empty.
pub struct EvaluationExporter<W: io::Write = fs::File> {
    writer: Writer<W>,
    target: String,
}

impl EvaluationExporter<fs::File> {
    pub fn create(path: &str) -> Result<Self, DosewiseError> {
        let writer =
            Writer::from_path(path).map_err(|e| DosewiseError::CsvError(path.to_string(), e))?;
        Ok(Self {
            writer,
            target: path.to_string(),
        })
    }
}

impl<W: io::Write> EvaluationExporter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: Writer::from_writer(inner),
            target: "<writer>".to_string(),
        }
    }

    pub fn write_evaluation(
        &mut self,
        evaluation: &ProductEvaluation,
    ) -> Result<(), DosewiseError> {
        if evaluation.ingredient_evaluations.is_empty() {
            self.write_row(ExportRow::new(evaluation, None))?;
        }
        for ingredient in &evaluation.ingredient_evaluations {
            self.write_row(ExportRow::new(evaluation, Some(ingredient)))?;
        }
        self.writer
            .flush()
            .map_err(|e| DosewiseError::FileIO(self.target.clone(), e))
    }

    fn write_row(&mut self, row: ExportRow<'_>) -> Result<(), DosewiseError> {
        self.writer
            .serialize(row)
            .map_err(|e| DosewiseError::CsvError(self.target.clone(), e))
    }

    pub fn into_inner(self) -> Result<W, DosewiseError> {
        let target = self.target;
        self.writer.into_inner().map_err(|e| {
            let source = io::Error::new(e.error().kind(), e.error().to_string());
            DosewiseError::FileIO(target, source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation() -> ProductEvaluation {
        ProductEvaluation {
            product: "Example Pre-Workout".to_string(),
            cost_per_serving: 1.333,
            total_theoretical_value: 0.1,
            cost_effectiveness_score: 0.075,
            ingredient_evaluations: vec![
                IngredientEvaluation {
                    name: "Caffeine Anhydrous".to_string(),
                    amount_mg: 200.0,
                    dosage_score: Some(1.0),
                    dosage_reason: Some("at optimal dose (200mg)".to_string()),
                    cost_per_mg: Some(0.0005),
                    value_contribution: Some(0.1),
                    skip_reason: None,
                },
                IngredientEvaluation {
                    name: "Creatine Monohydrate".to_string(),
                    amount_mg: 5000.0,
                    dosage_score: None,
                    dosage_reason: None,
                    cost_per_mg: None,
                    value_contribution: None,
                    skip_reason: Some(SkipReason::MissingCost),
                },
            ],
            analyzed_count: 1,
            total_count: 2,
        }
    }

    fn export(evaluation: &ProductEvaluation) -> String {
        let mut exporter = EvaluationExporter::from_writer(Vec::new());
        exporter.write_evaluation(evaluation).unwrap();
        String::from_utf8(exporter.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn writes_one_row_per_ingredient_including_skips() {
        let csv = export(&evaluation());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("product,cost_per_serving,"));
        assert!(lines[0].ends_with(",value_contribution,skip_reason"));
        assert!(lines[1]
            .contains("Caffeine Anhydrous,200.0,1.0,at optimal dose (200mg),0.0005,0.1,"));
        assert!(lines[1].ends_with(','));
        assert!(lines[2].ends_with("Creatine Monohydrate,5000.0,,,,,missing_cost"));
    }

    #[test]
    fn product_without_ingredient_rows_still_exported() {
        let mut empty = evaluation();
        empty.ingredient_evaluations.clear();
        let csv = export(&empty);

        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().ends_with(",,,,,,,"));
    }
}
