use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futureeval_chart::config::Config;
use futureeval_chart::layout::label_placement::{LabelStyle, PlottedPoint, Rect, place_labels};
use futureeval_chart::render::render_svg;
use futureeval_chart::trend::{Observation, SotaTrend, compute_frontier, fit_linear_regression};
use futureeval_chart::{Highlight, RuleClassifier, compute_chart, parse_dataset};
use std::hint::black_box;

const DAY_MS: f64 = 86_400_000.0;
const START_MS: f64 = 1_672_531_200_000.0;

/// Deterministic noisy upward trend.
fn synthetic_observations(count: usize) -> Vec<Observation> {
    (0..count)
        .map(|i| {
            let day = (i * 7 % 900) as f64;
            let wobble = ((i * 37) % 23) as f64 - 11.0;
            Observation::new(START_MS + day * DAY_MS, day * 0.02 + wobble * 0.4)
        })
        .collect()
}

/// Points packed into a narrow band, every one of them wanting a label.
fn dense_points(count: usize, width: f32, height: f32) -> Vec<PlottedPoint> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count.max(1) as f32;
            PlottedPoint {
                pixel_x: 80.0 + t * (width - 160.0),
                pixel_y: height * 0.5 + ((i * 13) % 17) as f32 * 3.0 - 24.0,
                text: format!("Model {i}"),
                is_obstacle: true,
                wants_label: true,
            }
        })
        .collect()
}

fn synthetic_dataset(count: usize) -> String {
    let families = ["GPT", "Claude", "Gemini", "Llama", "Grok", "DeepSeek"];
    let mut out = String::from("{ title: \"Synthetic\", entries: [\n");
    for (i, obs) in synthetic_observations(count).iter().enumerate() {
        out.push_str(&format!(
            "  {{ name: \"{} {}\", timestamp: {}, score: {} }},\n",
            families[i % families.len()],
            i,
            obs.x,
            obs.y
        ));
    }
    out.push_str("  { name: \"Pros\", kind: \"pro\", timestamp: 1700000000000, score: 40 },\n]}");
    out
}

fn bench_trend(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend");
    for count in [50usize, 500, 5_000] {
        let observations = synthetic_observations(count);
        group.bench_with_input(
            BenchmarkId::new("frontier", count),
            &observations,
            |b, data| {
                b.iter(|| black_box(compute_frontier(black_box(data)).len()));
            },
        );
        group.bench_with_input(BenchmarkId::new("fit", count), &observations, |b, data| {
            b.iter(|| black_box(fit_linear_regression(black_box(data))));
        });
        group.bench_with_input(
            BenchmarkId::new("sota_trend", count),
            &observations,
            |b, data| {
                b.iter(|| black_box(SotaTrend::compute(black_box(data), Some(40.0))));
            },
        );
    }
    group.finish();
}

fn bench_label_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_placement");
    let style = LabelStyle::default();
    let bounds = Rect::new(4.0, 4.0, 952.0, 552.0);
    for count in [20usize, 80, 200] {
        let points = dense_points(count, 960.0, 560.0);
        group.bench_with_input(BenchmarkId::from_parameter(count), &points, |b, pts| {
            b.iter(|| black_box(place_labels(black_box(pts), &style, bounds).len()));
        });
    }
    group.finish();
}

fn bench_chart(c: &mut Criterion) {
    let mut group = c.benchmark_group("chart");
    let config = Config::default();
    let classifier = RuleClassifier::default();
    for count in [30usize, 150] {
        let dataset = parse_dataset(&synthetic_dataset(count)).expect("parse failed");
        group.bench_with_input(BenchmarkId::new("layout", count), &dataset, |b, data| {
            b.iter(|| {
                let layout =
                    compute_chart(black_box(data), &config.chart, &Highlight::hover(3), &classifier);
                black_box(layout.labels.len());
            });
        });
        let layout = compute_chart(&dataset, &config.chart, &Highlight::default(), &classifier);
        group.bench_with_input(BenchmarkId::new("render", count), &layout, |b, layout| {
            b.iter(|| black_box(render_svg(black_box(layout), &config.theme).len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_trend, bench_label_placement, bench_chart);
criterion_main!(benches);
