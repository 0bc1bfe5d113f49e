//! Charts rendered from product evaluations.

use anyhow::Result;
use dosewise_core::evaluation::ProductEvaluation;
use plotters::prelude::*;
use std::path::Path;

/// Turns a product name into a safe file stem:
/// "Gorilla Mode (2 Scoops)" becomes "gorilla_mode_2_scoops".
fn file_stem(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Draws a bar chart of each analyzed ingredient's value contribution per serving.
pub fn plot_value_contributions(output_dir: &str, evaluation: &ProductEvaluation) -> Result<()> {
    let bars: Vec<(String, f64)> = evaluation
        .analyzed()
        .filter_map(|i| i.value_contribution.map(|v| (i.name.clone(), v)))
        .collect();

    if bars.is_empty() {
        println!(
            "[Plotting] Warning: No analyzed ingredients in '{}', skipping chart.",
            evaluation.product
        );
        return Ok(());
    }

    let path = Path::new(output_dir).join(format!("value_{}.png", file_stem(&evaluation.product)));
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_value = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let y_max = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Value Contributions: {}", evaluation.product),
            ("sans-serif", 40).into_font(),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..bars.len()).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                bars.get(*i).map(|(name, _)| name.clone()).unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .y_desc("Value per serving (USD)")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.mix(0.7).filled())
            .margin(20)
            .data(bars.iter().enumerate().map(|(i, (_, v))| (i, *v))),
    )?;

    root.present()?;
    println!("[Plotting] Saved chart to '{}'.", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_strips_punctuation() {
        assert_eq!(file_stem("Gorilla Mode (2 Scoops)"), "gorilla_mode_2_scoops");
        assert_eq!(file_stem("  C4 Original  "), "c4_original");
    }
}
