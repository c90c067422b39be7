use crate::data::{FamilyRule, default_family_rules};
use crate::layout::label_placement::LabelStyle;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            top: 48.0,
            right: 32.0,
            bottom: 48.0,
            left: 64.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub width: f32,
    pub height: f32,
    /// Insets from the chart edge to the plot area.
    pub padding: Padding,
    /// Labels keep this far inside the plot area.
    pub edge_padding: f32,
    pub label: LabelStyle,
    /// Fraction of the score span added above and below the data.
    pub domain_padding: f64,
    /// A future crossing extends the x axis at most this far past the data.
    pub max_projection_years: f64,
    pub x_tick_count: usize,
    pub y_tick_count: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 560.0,
            padding: Padding::default(),
            edge_padding: 4.0,
            label: LabelStyle::default(),
            domain_padding: 0.08,
            max_projection_years: 3.0,
            x_tick_count: 6,
            y_tick_count: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// PNG pixels per SVG unit.
    pub png_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            png_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub chart: ChartConfig,
    pub render: RenderConfig,
    pub families: Vec<FamilyRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::light(),
            chart: ChartConfig::default(),
            render: RenderConfig::default(),
            families: default_family_rules(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    chart: Option<ChartConfig>,
    families: Option<Vec<FamilyRule>>,
    /// Keep the default family rules and append these after them.
    extra_families: Option<Vec<FamilyRule>>,
    png_scale: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    muted_text_color: Option<String>,
    axis_color: Option<String>,
    grid_color: Option<String>,
    background: Option<String>,
    reference_color: Option<String>,
    trend_color: Option<String>,
    frontier_color: Option<String>,
    human_color: Option<String>,
    dimmed_opacity: Option<f32>,
    family_colors: Option<Vec<String>>,
}

/// Defaults, overlaid with whatever a JSON/JSON5 config file sets.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "dark" => config.theme = Theme::dark(),
            "light" | "default" => config.theme = Theme::light(),
            other => tracing::warn!(theme = other, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.muted_text_color {
            config.theme.muted_text_color = v;
        }
        if let Some(v) = vars.axis_color {
            config.theme.axis_color = v;
        }
        if let Some(v) = vars.grid_color {
            config.theme.grid_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.reference_color {
            config.theme.reference_color = v;
        }
        if let Some(v) = vars.trend_color {
            config.theme.trend_color = v;
        }
        if let Some(v) = vars.frontier_color {
            config.theme.frontier_color = v;
        }
        if let Some(v) = vars.human_color {
            config.theme.human_color = v;
        }
        if let Some(v) = vars.dimmed_opacity {
            config.theme.dimmed_opacity = v;
        }
        if let Some(v) = vars.family_colors {
            config.theme.family_colors = v;
        }
    }

    if let Some(chart) = parsed.chart {
        config.chart = chart;
    }
    if let Some(families) = parsed.families {
        config.families = families;
    }
    if let Some(extra) = parsed.extra_families {
        config.families.extend(extra);
    }
    if let Some(scale) = parsed.png_scale {
        config.render.png_scale = scale;
    }
    Ok(config)
}
