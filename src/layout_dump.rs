use crate::layout::ChartLayout;
use crate::layout::label_placement::{Rect, TextAnchor};
use crate::trend::{CrossingResult, LinearFit, Observation};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Engine results for one chart, for consumers that draw it themselves.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDump {
    pub width: f32,
    pub height: f32,
    pub plot: Rect,
    pub reference: Option<f64>,
    pub frontier: Vec<Observation>,
    pub fit: Option<LinearFit>,
    pub crossing: CrossingResult,
    pub points: Vec<PointDump>,
    pub labels: Vec<LabelDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDump {
    pub name: String,
    pub family: String,
    pub x: f32,
    pub y: f32,
    pub on_frontier: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDump {
    pub text: String,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub text_x: f32,
    pub text_y: f32,
    pub text_anchor: TextAnchor,
    pub rect: Rect,
    pub overlaps: usize,
}

impl ChartDump {
    pub fn from_layout(layout: &ChartLayout) -> Self {
        let points = layout
            .points
            .iter()
            .map(|point| PointDump {
                name: point.name.clone(),
                family: point.family.clone(),
                x: point.x,
                y: point.y,
                on_frontier: point.on_frontier,
            })
            .collect();

        let labels = layout
            .labels
            .iter()
            .map(|label| LabelDump {
                text: layout
                    .points
                    .get(label.point_index)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                anchor_x: label.anchor_x,
                anchor_y: label.anchor_y,
                text_x: label.text_x,
                text_y: label.text_y,
                text_anchor: label.text_anchor,
                rect: label.rect,
                overlaps: label.overlaps,
            })
            .collect();

        Self {
            width: layout.width,
            height: layout.height,
            plot: layout.plot,
            reference: layout.reference,
            frontier: layout.trend.frontier.clone(),
            fit: layout.trend.fit,
            crossing: layout.trend.crossing,
            points,
            labels,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &ChartLayout) -> anyhow::Result<()> {
    let dump = ChartDump::from_layout(layout);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
