use futureeval_chart::config::{Config, parse_config};
use futureeval_chart::layout_dump::ChartDump;
use futureeval_chart::theme::Theme;
use futureeval_chart::{Highlight, layout_chart, render_chart_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartRenderOptions {
    theme: Option<String>,
    /// Full config document (JSON5), applied before the other options.
    config: Option<String>,
    font_family: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    #[serde(default)]
    select: Vec<String>,
    hover: Option<usize>,
}

fn build_config(options: &ChartRenderOptions) -> Result<Config, String> {
    let mut config = match options.config.as_deref() {
        Some(raw) => parse_config(raw).map_err(|error| error.to_string())?,
        None => Config::default(),
    };
    if options.theme.as_deref() == Some("dark") {
        config.theme = Theme::dark();
    }
    if let Some(font_family) = &options.font_family {
        config.theme.font_family = font_family.clone();
    }
    if let Some(width) = options.width {
        config.chart.width = width;
    }
    if let Some(height) = options.height {
        config.chart.height = height;
    }
    // No system fonts in the browser: label widths are always estimated.
    config.chart.label.font_family = None;
    Ok(config)
}

fn build_highlight(options: &ChartRenderOptions) -> Highlight {
    Highlight {
        hovered: options.hover,
        selected: options.select.iter().cloned().collect(),
    }
}

fn parse_options(options_json: Option<String>) -> Result<ChartRenderOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str::<ChartRenderOptions>(&raw)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(ChartRenderOptions::default()),
    }
}

#[wasm_bindgen]
pub fn render_futureeval_svg(
    dataset_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    let config = build_config(&options).map_err(|error| JsValue::from_str(&error))?;
    render_chart_svg(dataset_json, &config, &build_highlight(&options))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Frontier, fit, crossing and placed labels as a JSON string.
#[wasm_bindgen]
pub fn compute_futureeval_layout(
    dataset_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    let config = build_config(&options).map_err(|error| JsValue::from_str(&error))?;
    let layout = layout_chart(dataset_json, &config, &build_highlight(&options))
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    serde_json::to_string(&ChartDump::from_layout(&layout))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use futureeval_chart::{layout_chart, render_chart_svg};

    use crate::{ChartRenderOptions, build_config, build_highlight};

    const DATASET: &str = r#"{
        "title": "FutureEval",
        "entries": [
            { "name": "GPT-4o", "date": "2024-05-13", "score": 8 },
            { "name": "Claude 3.5 Sonnet", "date": "2024-06-20", "score": 12 },
            { "name": "o1", "date": "2024-12-05", "score": 17 },
            { "name": "Pro Forecasters", "kind": "pro", "date": "2024-07-01", "score": 35 }
        ]
    }"#;

    #[test]
    fn renders_chart_with_frontier_labels() {
        let options = ChartRenderOptions::default();
        let config = build_config(&options).unwrap();
        let svg = render_chart_svg(DATASET, &config, &build_highlight(&options))
            .expect("dataset should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("FutureEval"));
        assert!(svg.contains("Claude 3.5 Sonnet"));
    }

    #[test]
    fn options_drive_selection_and_size() {
        let options: ChartRenderOptions = serde_json::from_str(
            r#"{ "theme": "dark", "width": 640, "select": ["Anthropic"] }"#,
        )
        .unwrap();
        let config = build_config(&options).unwrap();
        assert_eq!(config.chart.width, 640.0);
        assert!(config.chart.label.font_family.is_none());

        let layout = layout_chart(DATASET, &config, &build_highlight(&options)).unwrap();
        assert_eq!(layout.labels.len(), 1);
        assert_eq!(layout.points[layout.labels[0].point_index].family, "Anthropic");
    }

    #[test]
    fn bad_dataset_is_an_error() {
        let config = build_config(&ChartRenderOptions::default()).unwrap();
        assert!(layout_chart("{ entries: [", &config, &Default::default()).is_err());
    }
}
