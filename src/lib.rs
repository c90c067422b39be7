#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod data;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod trend;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{ChartConfig, Config};
pub use data::{Dataset, DataError, FamilyClassifier, RuleClassifier, parse_dataset};
pub use layout::label_placement::{PlacedLabel, PlottedPoint, Rect, place_labels};
pub use layout::{ChartLayout, Highlight, compute_chart};
pub use trend::{CrossingResult, LinearFit, Observation, SotaTrend};

/// Parse a dataset and lay it out with the classifier built from `config`.
pub fn layout_chart(
    input: &str,
    config: &Config,
    highlight: &Highlight,
) -> Result<ChartLayout, DataError> {
    let dataset = parse_dataset(input)?;
    let classifier = RuleClassifier::from_rules(&config.families)?;
    Ok(compute_chart(&dataset, &config.chart, highlight, &classifier))
}

pub fn render_chart_svg(
    input: &str,
    config: &Config,
    highlight: &Highlight,
) -> Result<String, DataError> {
    let layout = layout_chart(input, config, highlight)?;
    Ok(render::render_svg(&layout, &config.theme))
}
