use crate::config::{Config, load_config};
use crate::data::{RuleClassifier, load_dataset, parse_dataset};
use crate::layout::{ChartLayout, Highlight, compute_chart};
use crate::layout::scale::format_month;
use crate::layout_dump::write_layout_dump;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fevl",
    version,
    about = "FutureEval chart renderer: SOTA trend projection with collision-free labels"
)]
pub struct Args {
    /// Leaderboard dataset (JSON or JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Chart width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Chart height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Highlight a family (repeatable)
    #[arg(short = 's', long = "select")]
    pub select: Vec<String>,

    /// Treat the observation at this index as hovered
    #[arg(long = "hover")]
    pub hover: Option<usize>,

    /// Estimate label widths instead of reading system fonts
    #[arg(long = "fast-text")]
    pub fast_text: bool,

    /// Write the computed layout as JSON
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    apply_args(&mut config, &args);

    let dataset = match args.input.as_deref() {
        Some(path) if path != Path::new("-") => load_dataset(path)?,
        _ => {
            let mut buf = String::new();
            io::Read::read_to_string(&mut io::stdin(), &mut buf)?;
            parse_dataset(&buf)?
        }
    };
    if dataset.entries.is_empty() {
        return Err(anyhow::anyhow!("No leaderboard entries found in input"));
    }

    let classifier = RuleClassifier::from_rules(&config.families)?;
    let highlight = Highlight {
        hovered: args.hover,
        selected: args.select.iter().cloned().collect(),
    };
    let layout = compute_chart(&dataset, &config.chart, &highlight, &classifier);
    report(&layout);

    if let Some(dump_path) = args.dump.as_deref() {
        write_layout_dump(dump_path, &layout)?;
        info!("Wrote layout dump: {}", dump_path.display());
    }

    let svg = render_svg(&layout, &config.theme);
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = args
                .output
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            write_output_png(&svg, output, &config.render, &config.theme)?;
            info!("Wrote chart: {}", output.display());
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_args(config: &mut Config, args: &Args) {
    if let Some(width) = args.width {
        config.chart.width = width;
    }
    if let Some(height) = args.height {
        config.chart.height = height;
    }
    if args.fast_text {
        config.chart.label.font_family = None;
    } else if config.chart.label.font_family.is_none() {
        config.chart.label.font_family = Some(config.theme.font_family.clone());
    }
}

fn report(layout: &ChartLayout) {
    info!(
        points = layout.points.len(),
        frontier = layout.trend.frontier.len(),
        labels = layout.labels.len(),
        "chart laid out"
    );
    match (layout.crossing().timestamp, layout.reference) {
        (Some(ts), Some(reference)) if layout.crossing().is_future => {
            info!(
                "SOTA trend reaches reference score {reference:.1} around {}",
                format_month(ts)
            );
        }
        (Some(ts), Some(reference)) => {
            info!(
                "SOTA trend line meets reference score {reference:.1} at {} (not ahead of the data)",
                format_month(ts)
            );
        }
        (None, Some(_)) => warn!("SOTA trend has no crossing with the reference score"),
        (_, None) => info!("no reference score; skipping crossing projection"),
    }
}
