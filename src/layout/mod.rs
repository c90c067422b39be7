// Chart assembly: maps leaderboard data into pixel space, runs the SOTA
// trend engine over the bot scores and places point labels for the current
// interaction state. Every call is a pure function of its inputs; hover and
// selection changes simply re-run `compute_chart`.

pub mod label_placement;
pub mod scale;

use crate::config::ChartConfig;
use crate::data::{
    Dataset, EntryKind, FamilyClassifier, NamedObservation, group_by_family, map_entries,
};
use crate::trend::{CrossingResult, Observation, SotaTrend, compute_frontier, frontier_indices};
use label_placement::{PlacedLabel, PlottedPoint, Rect, place_labels};
use scale::{LinearScale, format_month, nice_ticks, pad_domain, time_ticks};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

pub use label_placement::{LabelStyle, TextAnchor};

const MS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Hover and selection state driving which points are labeled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    /// Index into the mapped observations.
    pub hovered: Option<usize>,
    /// Selected family ids. Empty means nothing is selected.
    pub selected: BTreeSet<String>,
}

impl Highlight {
    pub fn hover(index: usize) -> Self {
        Self {
            hovered: Some(index),
            ..Default::default()
        }
    }

    pub fn select<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hovered: None,
            selected: families.into_iter().map(Into::into).collect(),
        }
    }

    fn is_active(&self, family: &str) -> bool {
        self.selected.is_empty() || self.selected.contains(family)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub name: String,
    pub family: String,
    pub family_index: usize,
    pub kind: EntryKind,
    pub value: Observation,
    pub x: f32,
    pub y: f32,
    pub on_frontier: bool,
    /// False when a selection excludes this point's family.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub pos: f32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyFrontier {
    pub family: String,
    pub family_index: usize,
    pub path: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub title: Option<String>,
    pub width: f32,
    pub height: f32,
    pub plot: Rect,
    pub label_bounds: Rect,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub points: Vec<ChartPoint>,
    pub families: Vec<String>,
    pub labels: Vec<PlacedLabel>,
    pub trend: SotaTrend,
    pub reference: Option<f64>,
    pub reference_y: Option<f32>,
    /// Overall bot frontier in pixels.
    pub frontier_path: Vec<(f32, f32)>,
    /// Fitted line over the observed range.
    pub trend_observed: Vec<(f32, f32)>,
    /// Fitted line from the last observation to the projected crossing.
    pub trend_projected: Vec<(f32, f32)>,
    pub crossing_marker: Option<(f32, f32)>,
    pub family_frontiers: Vec<FamilyFrontier>,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    pub label_font_size: f32,
}

impl ChartLayout {
    pub fn crossing(&self) -> CrossingResult {
        self.trend.crossing
    }
}

pub fn compute_chart(
    dataset: &Dataset,
    config: &ChartConfig,
    highlight: &Highlight,
    classifier: &dyn FamilyClassifier,
) -> ChartLayout {
    let mapped = map_entries(&dataset.entries, classifier);
    let reference = dataset.reference_score();

    let bot_indices: Vec<usize> = (0..mapped.len())
        .filter(|&i| mapped[i].kind == EntryKind::Bot)
        .collect();
    let bot_points: Vec<Observation> = bot_indices.iter().map(|&i| mapped[i].point).collect();
    let trend = SotaTrend::compute(&bot_points, reference);
    let on_frontier: BTreeSet<usize> = frontier_indices(&bot_points)
        .into_iter()
        .map(|i| bot_indices[i])
        .collect();
    debug!(
        observations = mapped.len(),
        frontier = on_frontier.len(),
        crossing = ?trend.crossing.timestamp,
        "computed sota trend"
    );

    let plot = Rect::new(
        config.padding.left,
        config.padding.top,
        (config.width - config.padding.left - config.padding.right).max(0.0),
        (config.height - config.padding.top - config.padding.bottom).max(0.0),
    );
    let label_bounds = plot.shrink(config.edge_padding);

    let (x_domain, y_domain) = domains(&mapped, &trend, reference, config);
    let x_scale = LinearScale::new(x_domain, (plot.x, plot.right()));
    let y_scale = LinearScale::new(y_domain, (plot.bottom(), plot.y));

    let series = group_by_family(&mapped);
    let families: Vec<String> = series.iter().map(|s| s.family.clone()).collect();
    let points: Vec<ChartPoint> = mapped
        .iter()
        .enumerate()
        .map(|(i, obs)| ChartPoint {
            name: obs.name.clone(),
            family: obs.family.clone(),
            family_index: families.iter().position(|f| *f == obs.family).unwrap_or(0),
            kind: obs.kind,
            value: obs.point,
            x: x_scale.map(obs.point.x),
            y: y_scale.map(obs.point.y),
            on_frontier: on_frontier.contains(&i),
            active: highlight.is_active(&obs.family),
        })
        .collect();

    let plotted = plotted_points(&points, highlight);
    let labels = place_labels(&plotted, &config.label, label_bounds);
    if labels.len() < plotted.iter().filter(|p| p.wants_label).count() {
        debug!(
            requested = plotted.iter().filter(|p| p.wants_label).count(),
            placed = labels.len(),
            "some labels did not fit"
        );
    }

    let to_pixels = |o: &Observation| (x_scale.map(o.x), y_scale.map(o.y));
    let frontier_path = trend.frontier.iter().map(to_pixels).collect();
    let (trend_observed, trend_projected) = trend_segments(&trend, &bot_points, x_domain.1);
    let trend_observed = trend_observed.iter().map(to_pixels).collect();
    let trend_projected = trend_projected.iter().map(to_pixels).collect();
    let crossing_marker = match (trend.crossing.timestamp, reference) {
        (Some(x), Some(target)) if trend.crossing.is_future && x <= x_domain.1 => {
            Some(to_pixels(&Observation::new(x, target)))
        }
        _ => None,
    };
    let family_frontiers = series
        .iter()
        .enumerate()
        .filter(|(_, s)| highlight.selected.contains(&s.family))
        .map(|(family_index, s)| FamilyFrontier {
            family: s.family.clone(),
            family_index,
            path: compute_frontier(&s.points()).iter().map(to_pixels).collect(),
        })
        .collect();

    let x_ticks = time_ticks(x_domain.0, x_domain.1, config.x_tick_count)
        .into_iter()
        .map(|value| Tick {
            value,
            pos: x_scale.map(value),
            label: format_month(value),
        })
        .collect();
    let y_ticks = nice_ticks(y_domain.0, y_domain.1, config.y_tick_count)
        .into_iter()
        .map(|value| Tick {
            value,
            pos: y_scale.map(value),
            label: format_score(value),
        })
        .collect();

    ChartLayout {
        title: dataset.title.clone(),
        width: config.width,
        height: config.height,
        plot,
        label_bounds,
        x_scale,
        y_scale,
        points,
        families,
        labels,
        reference,
        reference_y: reference.map(|r| y_scale.map(r)),
        trend,
        frontier_path,
        trend_observed,
        trend_projected,
        crossing_marker,
        family_frontiers,
        x_ticks,
        y_ticks,
        label_font_size: config.label.font_size,
    }
}

/// Obstacles and label requests for the current interaction state.
///
/// With nothing selected every point blocks labels and only frontier points
/// are labeled. A selection narrows both to the selected families. The
/// hovered point is always labeled.
pub fn plotted_points(points: &[ChartPoint], highlight: &Highlight) -> Vec<PlottedPoint> {
    let selecting = !highlight.selected.is_empty();
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let hovered = highlight.hovered == Some(i);
            let wants_label = hovered
                || if selecting {
                    point.active
                } else {
                    point.on_frontier
                };
            PlottedPoint {
                pixel_x: point.x,
                pixel_y: point.y,
                text: point.name.clone(),
                is_obstacle: point.active || hovered,
                wants_label,
            }
        })
        .collect()
}

fn domains(
    mapped: &[NamedObservation],
    trend: &SotaTrend,
    reference: Option<f64>,
    config: &ChartConfig,
) -> ((f64, f64), (f64, f64)) {
    let xs = mapped.iter().map(|o| o.point.x);
    let (mut x_min, mut x_max) = min_max(xs).unwrap_or((0.0, 1.0));
    if x_max <= x_min {
        let (lo, hi) = pad_domain(x_min, x_max, 0.05);
        x_min = lo;
        x_max = hi;
    }
    if let Some(crossing) = trend.crossing.timestamp.filter(|_| trend.crossing.is_future) {
        let cap = x_max + config.max_projection_years.max(0.0) * MS_PER_YEAR;
        x_max = crossing.min(cap).max(x_max);
    }

    let ys = mapped.iter().map(|o| o.point.y).chain(reference);
    let (y_min, y_max) = min_max(ys).unwrap_or((0.0, 1.0));
    let y_domain = pad_domain(y_min, y_max, config.domain_padding.max(0.0));
    ((x_min, x_max), y_domain)
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Split the fitted line at the last observation: solid over the data,
/// projected beyond it up to the crossing or the axis end.
fn trend_segments(
    trend: &SotaTrend,
    observed: &[Observation],
    x_end: f64,
) -> (Vec<Observation>, Vec<Observation>) {
    let Some((first, last)) = min_max(observed.iter().map(|o| o.x)) else {
        return (Vec::new(), Vec::new());
    };
    let solid = trend.trend_line(first, last);
    let project_to = match trend.crossing.timestamp {
        Some(x) if trend.crossing.is_future => x.min(x_end),
        _ => x_end,
    };
    let dashed = if project_to > last {
        trend.trend_line(last, project_to)
    } else {
        Vec::new()
    };
    (solid, dashed)
}

fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
