// State-of-the-art trend computation: best-so-far frontier, least-squares
// fit, and the projected date at which the fit reaches a reference score.
// Everything here is total: degenerate input yields None or an empty Vec.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Milliseconds since the Unix epoch.
    pub x: f64,
    pub y: f64,
}

impl Observation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An observation that set a new best score when it appeared.
pub type FrontierPoint = Observation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossingResult {
    pub timestamp: Option<f64>,
    pub is_future: bool,
}

impl CrossingResult {
    pub const NONE: CrossingResult = CrossingResult {
        timestamp: None,
        is_future: false,
    };
}

/// Points that set a new maximum score at their point in time, in ascending
/// `x` order. Ties on `y` never open a new frontier point.
pub fn compute_frontier(observations: &[Observation]) -> Vec<FrontierPoint> {
    frontier_indices(observations)
        .into_iter()
        .map(|i| observations[i])
        .collect()
}

/// Input indices of the frontier points, in ascending `x` order.
pub fn frontier_indices(observations: &[Observation]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..observations.len()).collect();
    // sort_by is stable, so equal timestamps keep their input order.
    order.sort_by(|&a, &b| observations[a].x.total_cmp(&observations[b].x));

    let mut frontier = Vec::new();
    let mut best_y = f64::NEG_INFINITY;
    for idx in order {
        let y = observations[idx].y;
        if y > best_y {
            best_y = y;
            frontier.push(idx);
        }
    }
    frontier
}

/// Ordinary least squares over `points`.
///
/// Returns `None` for an empty slice or when every point shares the same
/// `x`. Sums are taken about the mean `x`, which is the same closed form as
/// `(nΣxy − ΣxΣy) / (nΣx² − (Σx)²)` but keeps precision for epoch
/// millisecond inputs.
pub fn fit_linear_regression(points: &[Observation]) -> Option<LinearFit> {
    let first_x = points.first()?.x;
    // The mean of identical values can round away from them, so check directly.
    if points.iter().all(|p| p.x == first_x) {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for p in points {
        let dx = p.x - mean_x;
        sxx += dx * dx;
        sxy += dx * (p.y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return None;
    }
    Some(LinearFit { slope, intercept })
}

/// The `x` at which `fit` reaches `target_y`. A flat line has no single
/// crossing.
pub fn calculate_crossing_x(fit: &LinearFit, target_y: f64) -> Option<f64> {
    if fit.slope == 0.0 {
        return None;
    }
    let x = (target_y - fit.intercept) / fit.slope;
    x.is_finite().then_some(x)
}

/// Fit the frontier and report where it reaches `target_score`.
///
/// A declining frontier still reports its algebraic crossing, which may lie
/// in the past. Callers that only want forward projections should check
/// `is_future`.
pub fn calculate_sota_crossing(
    frontier: &[Observation],
    target_score: f64,
    max_observed_x: Option<f64>,
) -> CrossingResult {
    let Some(fit) = fit_linear_regression(frontier) else {
        return CrossingResult::NONE;
    };
    crossing_for_fit(&fit, frontier, target_score, max_observed_x)
}

fn crossing_for_fit(
    fit: &LinearFit,
    points: &[Observation],
    target_score: f64,
    max_observed_x: Option<f64>,
) -> CrossingResult {
    let Some(crossing_x) = calculate_crossing_x(fit, target_score) else {
        return CrossingResult::NONE;
    };
    let last_x = max_observed_x.unwrap_or_else(|| {
        points
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max)
    });
    CrossingResult {
        timestamp: Some(crossing_x),
        is_future: crossing_x > last_x,
    }
}

/// Two endpoints of the frontier fit at `x_min` and `x_max`, or nothing when
/// the frontier cannot be fitted.
pub fn generate_trend_line_data(
    frontier: &[Observation],
    x_min: f64,
    x_max: f64,
) -> Vec<Observation> {
    match fit_linear_regression(frontier) {
        Some(fit) => trend_line_for_fit(&fit, x_min, x_max),
        None => Vec::new(),
    }
}

fn trend_line_for_fit(fit: &LinearFit, x_min: f64, x_max: f64) -> Vec<Observation> {
    vec![
        Observation::new(x_min, fit.value_at(x_min)),
        Observation::new(x_max, fit.value_at(x_max)),
    ]
}

/// Frontier, fit, and crossing for one series of observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SotaTrend {
    pub frontier: Vec<Observation>,
    pub fit: Option<LinearFit>,
    pub crossing: CrossingResult,
    pub max_observed_x: Option<f64>,
}

impl SotaTrend {
    /// The fit runs over the frontier, falling back to every observation when
    /// the frontier has fewer than two points.
    pub fn compute(observations: &[Observation], reference: Option<f64>) -> Self {
        let frontier = compute_frontier(observations);
        let fit_points = if frontier.len() < 2 {
            observations
        } else {
            frontier.as_slice()
        };
        let fit = fit_linear_regression(fit_points);
        let max_observed_x = observations
            .iter()
            .map(|p| p.x)
            .reduce(f64::max);
        let crossing = match (fit.as_ref(), reference) {
            (Some(fit), Some(target)) => crossing_for_fit(fit, fit_points, target, max_observed_x),
            _ => CrossingResult::NONE,
        };
        Self {
            frontier,
            fit,
            crossing,
            max_observed_x,
        }
    }

    pub fn trend_line(&self, x_min: f64, x_max: f64) -> Vec<Observation> {
        match &self.fit {
            Some(fit) => trend_line_for_fit(fit, x_min, x_max),
            None => Vec::new(),
        }
    }
}
