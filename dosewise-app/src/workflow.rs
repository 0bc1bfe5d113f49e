use crate::config::KnowledgeBase;
use crate::plotting;
use anyhow::{bail, Context, Result};
use dosewise_core::{
    catalog::{DosageCatalog, OfferCatalog},
    cost::CostTable,
    evaluation::{Evaluator, ProductEvaluation, SkipReason},
    export::EvaluationExporter,
};
use dosewise_schemas::product::Product;
use std::path::Path;
use tracing::{info, warn};

/// What to evaluate and which outputs to produce.
pub struct RunOptions {
    pub product_names: Vec<String>,
    pub ingredient_filter: Option<Vec<String>>,
    pub show_ingredients: bool,
    pub output_dir: Option<String>,
    pub plot: bool,
}

/// Evaluates the selected products, prints a report for each and writes the
/// optional CSV export and charts.
pub fn run_evaluations(kb: &KnowledgeBase, options: &RunOptions) -> Result<Vec<ProductEvaluation>> {
    println!("\n--- [Workflow] Building catalogs ---");
    let offers = OfferCatalog::from_offers(&kb.offers);
    let dosages = DosageCatalog::from_ranges(&kb.dosages);
    if !offers.rejected.is_empty() || !dosages.rejected.is_empty() {
        warn!(
            offers = offers.rejected.len(),
            dosages = dosages.rejected.len(),
            "Some records were rejected while building catalogs"
        );
    }

    let evaluator = Evaluator::new(&offers, dosages);
    print_cost_table(evaluator.costs());

    let products = select_products(kb, &options.product_names)?;
    let mut evaluations = Vec::with_capacity(products.len());
    for product in products {
        match evaluator.evaluate_filtered(product, options.ingredient_filter.as_deref()) {
            Ok(evaluation) => {
                println!("\n{}", format_evaluation_report(&evaluation, options.show_ingredients));
                evaluations.push(evaluation);
            }
            Err(e) => {
                warn!(product = %product.name, error = %e, "Skipping product");
                println!("\nCould not evaluate '{}': {}", product.name, e);
            }
        }
    }

    if let Some(output_dir) = &options.output_dir {
        export_csv(output_dir, &evaluations)?;
        if options.plot {
            for evaluation in &evaluations {
                plotting::plot_value_contributions(output_dir, evaluation)?;
            }
        }
        println!("\nResults written to '{}'", output_dir);
    }

    Ok(evaluations)
}

fn select_products<'a>(kb: &'a KnowledgeBase, names: &[String]) -> Result<Vec<&'a Product>> {
    if names.is_empty() {
        return Ok(kb.products.iter().collect());
    }
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match kb.find_product(name) {
            Some(product) => selected.push(product),
            None => bail!("Product '{}' not found in knowledge base", name),
        }
    }
    Ok(selected)
}

fn export_csv(output_dir: &str, evaluations: &[ProductEvaluation]) -> Result<()> {
    let path = Path::new(output_dir).join("evaluations.csv");
    let path_str = path.to_string_lossy();
    let mut exporter = EvaluationExporter::create(&path_str)
        .with_context(|| format!("Failed to create export file {}", path_str))?;
    for evaluation in evaluations {
        exporter.write_evaluation(evaluation)?;
    }
    info!(path = %path_str, rows = evaluations.len(), "Wrote CSV export");
    Ok(())
}

fn print_cost_table(costs: &CostTable) {
    println!("\nInferred Costs:");
    if costs.is_empty() {
        println!("  (no ingredient costs could be inferred)");
    }
    for cost in costs.sorted() {
        println!(
            "  - {:<28} ${:.6}/mg (from {} offer{})",
            cost.ingredient_name,
            cost.cost_per_mg,
            cost.sample_size,
            if cost.sample_size == 1 { "" } else { "s" }
        );
    }
}

pub fn list_products(kb: &KnowledgeBase) {
    println!("\nAvailable Products:");
    println!("{}", "-".repeat(50));
    for (i, product) in kb.products.iter().enumerate() {
        println!("{}. {}", i + 1, product.name);
        for dose in &product.ingredients {
            println!("     - {} ({}{})", dose.name, dose.amount, dose.unit);
        }
    }
}

/// Renders a plain-text report for one evaluation.
pub fn format_evaluation_report(evaluation: &ProductEvaluation, show_ingredients: bool) -> String {
    let mut lines = vec![
        format!("Product Evaluation Report: {}", evaluation.product),
        "=".repeat(50),
        format!("Cost per serving: ${:.2}", evaluation.cost_per_serving),
        format!("Total theoretical value: ${:.2}", evaluation.total_theoretical_value),
        format!("Cost-effectiveness score: {:.2}", evaluation.cost_effectiveness_score),
        format!(
            "(Analyzed {} of {} ingredients)",
            evaluation.analyzed_count, evaluation.total_count
        ),
    ];
    if evaluation.no_ingredients_analyzed() {
        lines.push("No ingredients could be analyzed; score defaults to 0.".to_string());
    }
    lines.push(String::new());

    if show_ingredients && evaluation.analyzed().next().is_some() {
        lines.push("Ingredient Analysis:".to_string());
        lines.push("-".repeat(50));
        for ingredient in evaluation.analyzed() {
            lines.push(format!("{}:", ingredient.name));
            lines.push(format!("  Amount: {}mg", ingredient.amount_mg));
            if let (Some(score), Some(reason)) =
                (ingredient.dosage_score, ingredient.dosage_reason.as_deref())
            {
                lines.push(format!("  Dosage Score: {:.2}", score));
                lines.push(format!("  Reason: {}", reason));
            }
            if let Some(cost_per_mg) = ingredient.cost_per_mg {
                lines.push(format!("  Cost/mg: ${:.6}", cost_per_mg));
            }
            if let Some(value) = ingredient.value_contribution {
                lines.push(format!("  Value Contribution: ${:.2}", value));
            }
            lines.push(String::new());
        }
    }

    for (reason, heading) in [
        (SkipReason::MissingCost, "Missing cost data:"),
        (SkipReason::MissingDosage, "Missing dosage data:"),
    ] {
        let names: Vec<&str> = evaluation.skipped(reason).map(|i| i.name.as_str()).collect();
        if names.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        for name in names {
            lines.push(format!("  - {}", name));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
