// Label placement and collision avoidance for scatter-point annotations.
// All functions here work with pure pixel geometry, no SVG dependency.

use crate::text_metrics::measure_text_width;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Fallback glyph advance as a fraction of the font size.
const ESTIMATED_CHAR_WIDTH: f32 = 0.6;
/// Score weight per overlapping rectangle; dominates any overlap area.
const OVERLAP_COUNT_WEIGHT: f32 = 1_000_000.0;
const GRID_CELL: f32 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shrink by `pad` on every side, never below zero size.
    pub fn shrink(&self, pad: f32) -> Rect {
        Rect::new(
            self.x + pad,
            self.y + pad,
            (self.width - 2.0 * pad).max(0.0),
            (self.height - 2.0 * pad).max(0.0),
        )
    }

    /// Containment with a small tolerance for f32 rounding at clamped edges.
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f32 = 1e-3;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// A plotted dot in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlottedPoint {
    pub pixel_x: f32,
    pub pixel_y: f32,
    pub text: String,
    /// The dot footprint blocks labels even when the point is unlabeled.
    pub is_obstacle: bool,
    pub wants_label: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedLabel {
    /// Index into the input point slice.
    pub point_index: usize,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub text_x: f32,
    /// Vertical center of the text (rendered with a middle baseline).
    pub text_y: f32,
    pub text_anchor: TextAnchor,
    /// Index into the candidate offset table that won.
    pub candidate: usize,
    pub rect: Rect,
    /// Rectangles this label still overlaps; zero for a clean placement.
    pub overlaps: usize,
}

impl PlacedLabel {
    /// Closest point of the label box to the anchor, where a connector line
    /// from the dot should end.
    pub fn connector_end(&self) -> (f32, f32) {
        (
            self.anchor_x.clamp(self.rect.x, self.rect.right()),
            self.anchor_y.clamp(self.rect.y, self.rect.bottom()),
        )
    }

    pub fn connector_length(&self) -> f32 {
        let (ex, ey) = self.connector_end();
        ((ex - self.anchor_x).powi(2) + (ey - self.anchor_y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelStyle {
    pub font_size: f32,
    /// When set and resolvable, text width comes from real font metrics.
    pub font_family: Option<String>,
    pub dot_radius: f32,
    /// Inflation applied to candidates so near-touching boxes still collide.
    pub stroke_pad: f32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            font_family: None,
            dot_radius: 4.0,
            stroke_pad: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelCandidate {
    pub dx: f32,
    pub dy: f32,
    pub anchor: TextAnchor,
}

const fn candidate(dx: f32, dy: f32, anchor: TextAnchor) -> LabelCandidate {
    LabelCandidate { dx, dy, anchor }
}

/// Offsets tried for every label, most preferred first. The first clean
/// candidate wins, so this order is the tie-break.
pub const LABEL_CANDIDATES: [LabelCandidate; 25] = [
    candidate(6.0, -8.0, TextAnchor::Start),
    candidate(-6.0, -8.0, TextAnchor::End),
    candidate(6.0, 8.0, TextAnchor::Start),
    candidate(-6.0, 8.0, TextAnchor::End),
    candidate(8.0, 0.0, TextAnchor::Start),
    candidate(-8.0, 0.0, TextAnchor::End),
    candidate(0.0, -12.0, TextAnchor::Middle),
    candidate(0.0, 12.0, TextAnchor::Middle),
    candidate(12.0, -16.0, TextAnchor::Start),
    candidate(-12.0, -16.0, TextAnchor::End),
    candidate(12.0, 16.0, TextAnchor::Start),
    candidate(-12.0, 16.0, TextAnchor::End),
    candidate(18.0, 0.0, TextAnchor::Start),
    candidate(-18.0, 0.0, TextAnchor::End),
    candidate(0.0, -24.0, TextAnchor::Middle),
    candidate(0.0, 24.0, TextAnchor::Middle),
    candidate(24.0, -28.0, TextAnchor::Start),
    candidate(-24.0, -28.0, TextAnchor::End),
    candidate(24.0, 28.0, TextAnchor::Start),
    candidate(-24.0, 28.0, TextAnchor::End),
    candidate(32.0, 0.0, TextAnchor::Start),
    candidate(-32.0, 0.0, TextAnchor::End),
    candidate(0.0, -36.0, TextAnchor::Middle),
    candidate(0.0, 36.0, TextAnchor::Middle),
    candidate(0.0, -44.0, TextAnchor::Middle),
];

/// Chart area shrunk by `edge_padding` on every side.
pub fn safe_bounds(width: f32, height: f32, edge_padding: f32) -> Rect {
    Rect::new(0.0, 0.0, width, height).shrink(edge_padding)
}

pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    ESTIMATED_CHAR_WIDTH * font_size * text.chars().count() as f32
}

fn label_size(text: &str, style: &LabelStyle) -> (f32, f32) {
    let measured = match style.font_family.as_deref() {
        Some(family) => measure_text_width(text, style.font_size, family),
        None => None,
    };
    let width = measured.unwrap_or_else(|| estimate_text_width(text, style.font_size));
    (width, style.font_size + 2.0)
}

fn dot_rect(point: &PlottedPoint, radius: f32) -> Rect {
    Rect::new(
        point.pixel_x - radius,
        point.pixel_y - radius,
        radius * 2.0,
        radius * 2.0,
    )
}

/// Place a label for every point with `wants_label`.
///
/// Points are handled top to bottom (ascending `pixel_y`, stable). Each one
/// takes the first candidate that fits the bounds and collides with nothing
/// placed so far; failing that, the in-bounds candidate with the fewest and
/// smallest overlaps. A label that cannot fit the bounds at all is dropped.
/// The returned labels follow processing order.
pub fn place_labels(points: &[PlottedPoint], style: &LabelStyle, bounds: Rect) -> Vec<PlacedLabel> {
    let mut placed_rects: Vec<Rect> = points
        .iter()
        .filter(|p| p.is_obstacle)
        .map(|p| dot_rect(p, style.dot_radius))
        .collect();
    let mut grid = ObstacleGrid::new(GRID_CELL, &placed_rects);

    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| points[i].wants_label)
        .collect();
    order.sort_by(|&a, &b| points[a].pixel_y.total_cmp(&points[b].pixel_y));

    let mut labels = Vec::with_capacity(order.len());
    for idx in order {
        let point = &points[idx];
        let (width, height) = label_size(&point.text, style);
        let Some(label) = place_one(idx, point, width, height, style, bounds, &placed_rects, &grid)
        else {
            tracing::trace!(text = %point.text, "label dropped: no candidate fits bounds");
            continue;
        };
        grid.insert(placed_rects.len(), &label.rect);
        placed_rects.push(label.rect);
        labels.push(label);
    }
    labels
}

#[allow(clippy::too_many_arguments)]
fn place_one(
    idx: usize,
    point: &PlottedPoint,
    width: f32,
    height: f32,
    style: &LabelStyle,
    bounds: Rect,
    placed_rects: &[Rect],
    grid: &ObstacleGrid,
) -> Option<PlacedLabel> {
    let mut best: Option<(f32, PlacedLabel)> = None;
    for (cand_idx, cand) in LABEL_CANDIDATES.iter().enumerate() {
        let text_x = point.pixel_x + cand.dx;
        let text_y = point.pixel_y + cand.dy;
        let raw = candidate_rect(text_x, text_y, width, height, cand.anchor);
        let Some(rect) = clamp_rect_to_bounds(raw, bounds) else {
            continue;
        };
        let (count, area) = overlap_score(&inflate_rect(rect, style.stroke_pad), placed_rects, grid);
        let label = PlacedLabel {
            point_index: idx,
            anchor_x: point.pixel_x,
            anchor_y: point.pixel_y,
            text_x: text_x + (rect.x - raw.x),
            text_y: text_y + (rect.y - raw.y),
            text_anchor: cand.anchor,
            candidate: cand_idx,
            rect,
            overlaps: count,
        };
        if count == 0 {
            return Some(label);
        }
        let score = count as f32 * OVERLAP_COUNT_WEIGHT + area;
        if best.as_ref().is_none_or(|(best_score, _)| score < *best_score) {
            best = Some((score, label));
        }
    }
    best.map(|(_, label)| label)
}

fn candidate_rect(text_x: f32, text_y: f32, width: f32, height: f32, anchor: TextAnchor) -> Rect {
    let x = match anchor {
        TextAnchor::Start => text_x,
        TextAnchor::Middle => text_x - width / 2.0,
        TextAnchor::End => text_x - width,
    };
    Rect::new(x, text_y - height / 2.0, width, height)
}

/// Shift `rect` the least distance needed to sit inside `bounds`. `None` when
/// it is larger than the bounds on either axis.
fn clamp_rect_to_bounds(rect: Rect, bounds: Rect) -> Option<Rect> {
    if rect.width > bounds.width || rect.height > bounds.height {
        return None;
    }
    // A box as wide as the bounds can round its upper limit below the lower.
    let max_x = (bounds.right() - rect.width).max(bounds.x);
    let max_y = (bounds.bottom() - rect.height).max(bounds.y);
    let x = rect.x.clamp(bounds.x, max_x);
    let y = rect.y.clamp(bounds.y, max_y);
    Some(Rect::new(x, y, rect.width, rect.height))
}

fn overlap_score(rect: &Rect, placed: &[Rect], grid: &ObstacleGrid) -> (usize, f32) {
    let mut hits: Vec<usize> = grid.query(rect).collect();
    // Fixed summation order keeps scores reproducible.
    hits.sort_unstable();
    let mut count = 0;
    let mut area = 0.0;
    for i in hits {
        let overlap = overlap_area(rect, &placed[i]);
        if overlap > 0.0 {
            count += 1;
            area += overlap;
        }
    }
    (count, area)
}

pub(crate) fn overlap_area(a: &Rect, b: &Rect) -> f32 {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = a.right().min(b.right());
    let y1 = a.bottom().min(b.bottom());
    let w = (x1 - x0).max(0.0);
    let h = (y1 - y0).max(0.0);
    w * h
}

pub(crate) fn inflate_rect(rect: Rect, pad: f32) -> Rect {
    if pad <= 0.0 {
        return rect;
    }
    Rect::new(
        rect.x - pad,
        rect.y - pad,
        rect.width + pad * 2.0,
        rect.height + pad * 2.0,
    )
}

/// Two labels collide when one, inflated by `pad`, overlaps the other.
pub fn labels_collide(a: &Rect, b: &Rect, pad: f32) -> bool {
    overlap_area(&inflate_rect(*a, pad), b) > 0.0
}

/// Spatial index for fast overlap queries during label placement.
struct ObstacleGrid {
    cell: f32,
    /// Maps grid cell (ix, iy) to indices into the obstacle list.
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl ObstacleGrid {
    fn new(cell: f32, rects: &[Rect]) -> Self {
        let mut grid = Self {
            cell: cell.max(16.0),
            cells: HashMap::new(),
        };
        for (i, rect) in rects.iter().enumerate() {
            grid.insert(i, rect);
        }
        grid
    }

    fn cell_span(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        (
            (rect.x / self.cell).floor() as i32,
            (rect.y / self.cell).floor() as i32,
            (rect.right() / self.cell).floor() as i32,
            (rect.bottom() / self.cell).floor() as i32,
        )
    }

    fn insert(&mut self, idx: usize, rect: &Rect) {
        let (x0, y0, x1, y1) = self.cell_span(rect);
        for ix in x0..=x1 {
            for iy in y0..=y1 {
                self.cells.entry((ix, iy)).or_default().push(idx);
            }
        }
    }

    /// Indices of obstacles that could overlap with `rect`.
    fn query(&self, rect: &Rect) -> impl Iterator<Item = usize> + '_ {
        let (x0, y0, x1, y1) = self.cell_span(rect);
        let mut seen = HashSet::new();
        (x0..=x1)
            .flat_map(move |ix| (y0..=y1).map(move |iy| (ix, iy)))
            .flat_map(move |key| {
                self.cells
                    .get(&key)
                    .map(|v| v.as_slice())
                    .unwrap_or(&[])
                    .iter()
                    .copied()
            })
            .filter(move |idx| seen.insert(*idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_point(x: f32, y: f32, text: &str) -> PlottedPoint {
        PlottedPoint {
            pixel_x: x,
            pixel_y: y,
            text: text.to_string(),
            is_obstacle: true,
            wants_label: true,
        }
    }

    fn roomy() -> Rect {
        safe_bounds(800.0, 600.0, 8.0)
    }

    fn assert_no_collisions(labels: &[PlacedLabel], pad: f32) {
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert!(
                    !labels_collide(&a.rect, &b.rect, pad),
                    "labels {} and {} collide: {:?} vs {:?}",
                    a.point_index,
                    b.point_index,
                    a.rect,
                    b.rect
                );
            }
        }
    }

    #[test]
    fn overlap_area_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(overlap_area(&a, &b), 0.0);
    }

    #[test]
    fn overlap_area_partial_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(overlap_area(&a, &b), 25.0);
    }

    #[test]
    fn overlap_area_contained() {
        let a = Rect::new(0.0, 0.0, 20.0, 20.0);
        let b = Rect::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(overlap_area(&a, &b), 25.0);
    }

    #[test]
    fn touching_boxes_collide_only_with_padding() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!labels_collide(&a, &b, 0.0));
        assert!(labels_collide(&a, &b, 1.0));
    }

    #[test]
    fn clamp_shifts_without_resizing() {
        let bounds = Rect::new(10.0, 10.0, 100.0, 50.0);
        let clamped = clamp_rect_to_bounds(Rect::new(95.0, 0.0, 30.0, 14.0), bounds).unwrap();
        assert_eq!(clamped, Rect::new(80.0, 10.0, 30.0, 14.0));
        assert!(clamp_rect_to_bounds(Rect::new(0.0, 0.0, 120.0, 14.0), bounds).is_none());
    }

    #[test]
    fn candidate_table_grows_outward() {
        let reach = |c: &LabelCandidate| c.dx.abs().max(c.dy.abs());
        let first = reach(&LABEL_CANDIDATES[0]);
        let last = reach(&LABEL_CANDIDATES[LABEL_CANDIDATES.len() - 1]);
        assert!(first <= 8.0);
        assert!(last >= 44.0);
        for pair in LABEL_CANDIDATES.windows(2) {
            assert!(reach(&pair[0]) <= reach(&pair[1]) + 4.0);
        }
    }

    #[test]
    fn empty_input_places_nothing() {
        assert!(place_labels(&[], &LabelStyle::default(), roomy()).is_empty());
    }

    #[test]
    fn single_point_uses_first_candidate() {
        let points = vec![label_point(400.0, 300.0, "Claude 3.5 Sonnet")];
        let labels = place_labels(&points, &LabelStyle::default(), roomy());
        assert_eq!(labels.len(), 1);
        let label = &labels[0];
        assert_eq!(label.candidate, 0);
        assert_eq!(label.overlaps, 0);
        assert_eq!(label.text_anchor, TextAnchor::Start);
        assert_eq!(label.text_x, 406.0);
        assert_eq!(label.text_y, 292.0);
    }

    #[test]
    fn stacked_points_get_different_offsets() {
        let points = vec![
            label_point(200.0, 202.0, "GPT-4o"),
            label_point(200.0, 200.0, "GPT-4o mini"),
        ];
        let style = LabelStyle::default();
        let labels = place_labels(&points, &style, roomy());
        assert_eq!(labels.len(), 2);
        // The upper point is processed first and keeps the preferred slot.
        assert_eq!(labels[0].point_index, 1);
        assert_eq!(labels[0].candidate, 0);
        assert_ne!(labels[0].candidate, labels[1].candidate);
        assert_no_collisions(&labels, style.stroke_pad);
    }

    #[test]
    fn crowded_cluster_stays_collision_free() {
        let names = [
            "o1",
            "o3-mini",
            "GPT-4.1",
            "Claude 3.7",
            "Gemini 2.5",
            "DeepSeek R1",
        ];
        let points: Vec<PlottedPoint> = names
            .iter()
            .enumerate()
            .map(|(i, name)| label_point(300.0 + i as f32 * 3.0, 250.0 + i as f32 * 2.0, name))
            .collect();
        let style = LabelStyle::default();
        let labels = place_labels(&points, &style, roomy());
        assert_eq!(labels.len(), names.len());
        assert!(labels.iter().all(|l| l.overlaps == 0));
        assert_no_collisions(&labels, style.stroke_pad);
    }

    #[test]
    fn labels_stay_inside_bounds() {
        let bounds = safe_bounds(300.0, 200.0, 10.0);
        let points = vec![
            label_point(12.0, 12.0, "top left corner"),
            label_point(290.0, 12.0, "top right corner"),
            label_point(290.0, 190.0, "bottom right"),
            label_point(12.0, 190.0, "bottom left"),
        ];
        let labels = place_labels(&points, &LabelStyle::default(), bounds);
        assert_eq!(labels.len(), 4);
        for label in &labels {
            assert!(bounds.contains(&label.rect), "{:?} escapes {:?}", label.rect, bounds);
        }
    }

    #[test]
    fn clamped_label_moves_its_text() {
        let bounds = safe_bounds(200.0, 200.0, 10.0);
        let mut point = label_point(190.0, 100.0, "edge");
        point.is_obstacle = false;
        let label = &place_labels(&[point], &LabelStyle::default(), bounds)[0];
        assert_eq!(label.candidate, 0);
        assert!((label.rect.right() - bounds.right()).abs() < 1e-3);
        let expected_x = match label.text_anchor {
            TextAnchor::Start => label.rect.x,
            TextAnchor::Middle => label.rect.x + label.rect.width / 2.0,
            TextAnchor::End => label.rect.right(),
        };
        assert!((label.text_x - expected_x).abs() < 1e-4);
        assert!((label.text_y - (label.rect.y + label.rect.height / 2.0)).abs() < 1e-4);
    }

    #[test]
    fn label_exactly_as_wide_as_bounds_is_placed() {
        let style = LabelStyle {
            font_size: 10.0,
            ..LabelStyle::default()
        };
        assert_eq!(estimate_text_width("a", style.font_size), 6.0);
        let bounds = Rect::new(0.1, 0.0, 6.0, 100.0);
        let mut point = label_point(3.1, 50.0, "a");
        point.is_obstacle = false;

        let labels = place_labels(&[point], &style, bounds);
        assert_eq!(labels.len(), 1);
        assert!(bounds.contains(&labels[0].rect));
        assert!((labels[0].rect.x - bounds.x).abs() < 1e-3);

        let clamped = clamp_rect_to_bounds(Rect::new(9.1, 40.0, 6.0, 12.0), bounds).unwrap();
        assert!(clamped.x >= bounds.x);
    }

    #[test]
    fn oversized_label_is_dropped() {
        let bounds = safe_bounds(60.0, 60.0, 5.0);
        let points = vec![
            label_point(30.0, 30.0, "a label far too wide for this chart"),
            label_point(30.0, 40.0, "ok"),
        ];
        let labels = place_labels(&points, &LabelStyle::default(), bounds);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].point_index, 1);
    }

    #[test]
    fn obstacles_block_without_labels() {
        let style = LabelStyle::default();
        let first = LABEL_CANDIDATES[0];
        let anchor = label_point(100.0, 100.0, "target");
        let (w, h) = label_size(&anchor.text, &style);
        let rect = candidate_rect(100.0 + first.dx, 100.0 + first.dy, w, h, first.anchor);
        let blocker = PlottedPoint {
            pixel_x: rect.x + rect.width / 2.0,
            pixel_y: rect.y + rect.height / 2.0,
            text: String::new(),
            is_obstacle: true,
            wants_label: false,
        };
        let labels = place_labels(&[anchor, blocker], &style, roomy());
        assert_eq!(labels.len(), 1);
        assert_ne!(labels[0].candidate, 0);
    }

    #[test]
    fn least_overlap_fallback_when_boxed_in() {
        // Bounds barely larger than the label: every candidate clamps onto
        // the same spot, which overlaps the dot.
        let style = LabelStyle::default();
        let bounds = Rect::new(0.0, 0.0, 40.0, 20.0);
        let points = vec![label_point(20.0, 10.0, "abc")];
        let labels = place_labels(&points, &style, bounds);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].overlaps, 1);
        assert!(bounds.contains(&labels[0].rect));
    }

    #[test]
    fn placement_is_deterministic() {
        let points: Vec<PlottedPoint> = (0..20)
            .map(|i| {
                let t = i as f32;
                label_point(100.0 + (t * 37.0) % 180.0, 80.0 + (t * 53.0) % 120.0, "model")
            })
            .collect();
        let style = LabelStyle::default();
        let a = place_labels(&points, &style, roomy());
        let b = place_labels(&points, &style, roomy());
        assert_eq!(a, b);
    }

    #[test]
    fn connector_ends_on_label_box() {
        let points = vec![label_point(400.0, 300.0, "x")];
        let label = &place_labels(&points, &LabelStyle::default(), roomy())[0];
        let (ex, ey) = label.connector_end();
        assert!(ex >= label.rect.x && ex <= label.rect.right());
        assert!(ey >= label.rect.y && ey <= label.rect.bottom());
        assert!(label.connector_length() > 0.0);
    }
}
