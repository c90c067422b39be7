use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub muted_text_color: String,
    pub axis_color: String,
    pub grid_color: String,
    pub background: String,
    pub reference_color: String,
    pub trend_color: String,
    pub frontier_color: String,
    pub human_color: String,
    pub dimmed_opacity: f32,
    /// Cycled through by family, in first-seen order.
    pub family_colors: Vec<String>,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            text_color: "#161C22".to_string(),
            muted_text_color: "#5C6B7A".to_string(),
            axis_color: "#91999E".to_string(),
            grid_color: "#E4E7EB".to_string(),
            background: "#FFFFFF".to_string(),
            reference_color: "#D58B00".to_string(),
            trend_color: "#2F4155".to_string(),
            frontier_color: "#4E79A7".to_string(),
            human_color: "#D58B00".to_string(),
            dimmed_opacity: 0.25,
            family_colors: default_family_colors(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            text_color: "#EEF2F8".to_string(),
            muted_text_color: "#A0AEC0".to_string(),
            axis_color: "#6B7785".to_string(),
            grid_color: "#2A3440".to_string(),
            background: "#10161D".to_string(),
            reference_color: "#F2B84B".to_string(),
            trend_color: "#C7D2E5".to_string(),
            frontier_color: "#7FA9D6".to_string(),
            human_color: "#F2B84B".to_string(),
            dimmed_opacity: 0.3,
            family_colors: default_family_colors(),
        }
    }

    pub fn family_color(&self, index: usize) -> &str {
        if self.family_colors.is_empty() {
            return &self.frontier_color;
        }
        &self.family_colors[index % self.family_colors.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

fn default_family_colors() -> Vec<String> {
    [
        "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}
