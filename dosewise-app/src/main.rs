use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod plotting;
mod workflow;

/// Scores supplement formulas by the market value of their doses against their price.
#[derive(Debug, Parser)]
#[command(name = "dosewise", version, about)]
struct Cli {
    /// Directory containing `offers/`, `dosages/` and `products/`.
    #[arg(long, default_value = "./data/knowledge_base")]
    data_dir: String,

    /// Product to evaluate; repeat for several. Defaults to every product.
    #[arg(long = "product")]
    products: Vec<String>,

    /// Only analyze these ingredients (comma separated).
    #[arg(long, value_delimiter = ',')]
    ingredients: Option<Vec<String>>,

    /// List products and their ingredients, then exit.
    #[arg(long)]
    list: bool,

    /// Hide the per-ingredient breakdown in reports.
    #[arg(long)]
    hide_ingredients: bool,

    /// Where to write the CSV export and charts.
    #[arg(long)]
    output_dir: Option<String>,

    /// Print reports only; write no files.
    #[arg(long)]
    no_export: bool,

    /// Also render a value-contribution chart per product.
    #[arg(long)]
    plot: bool,

    /// Log debug details for every cost and score.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "dosewise_core=debug,dosewise_app=debug,warn"
    } else {
        "dosewise_core=info,dosewise_app=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!("--- Dosewise Cost-Effectiveness Analyzer ---");

    let kb = config::KnowledgeBase::load(&cli.data_dir)
        .with_context(|| format!("Failed to load knowledge base from '{}'", cli.data_dir))?;

    if cli.list {
        workflow::list_products(&kb);
        return Ok(());
    }

    let output_dir = if cli.no_export {
        None
    } else {
        let dir = cli.output_dir.clone().unwrap_or_else(|| {
            format!("./data/runs/eval_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
        });
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir))?;
        Some(dir)
    };

    let options = workflow::RunOptions {
        product_names: cli.products,
        ingredient_filter: cli.ingredients,
        show_ingredients: !cli.hide_ingredients,
        output_dir,
        plot: cli.plot,
    };

    let evaluations = workflow::run_evaluations(&kb, &options)?;
    println!("\nEvaluated {} product(s).", evaluations.len());

    Ok(())
}
