use crate::config::RenderConfig;
use crate::data::EntryKind;
use crate::layout::{ChartLayout, ChartPoint};
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

const CROSSING_MARKER_RADIUS: f32 = 6.0;
const CONNECTOR_MIN_LENGTH: f32 = 6.0;

pub fn render_svg(layout: &ChartLayout, theme: &Theme) -> String {
    let mut svg = String::new();
    let width = layout.width.max(1.0);
    let height = layout.height.max(1.0);
    let plot = layout.plot;

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    );

    if let Some(title) = &layout.title {
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
            plot.x,
            (plot.y - 18.0).max(theme.font_size),
            theme.font_family,
            theme.font_size + 4.0,
            theme.text_color,
            escape_xml(title)
        );
    }

    render_axes(&mut svg, layout, theme);

    if let Some(ref_y) = layout.reference_y {
        let _ = write!(
            svg,
            "<line x1=\"{:.2}\" y1=\"{ref_y:.2}\" x2=\"{:.2}\" y2=\"{ref_y:.2}\" stroke=\"{}\" stroke-width=\"1.5\" stroke-dasharray=\"2 3\"/>",
            plot.x,
            plot.right(),
            theme.reference_color
        );
    }

    for frontier in &layout.family_frontiers {
        let _ = write!(
            svg,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" stroke-opacity=\"0.8\"/>",
            step_path(&frontier.path),
            theme.family_color(frontier.family_index)
        );
    }

    if layout.frontier_path.len() > 1 {
        let _ = write!(
            svg,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>",
            step_path(&layout.frontier_path),
            theme.frontier_color
        );
    }

    if layout.trend_observed.len() == 2 {
        let _ = write!(
            svg,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>",
            points_to_path(&layout.trend_observed),
            theme.trend_color
        );
    }
    if layout.trend_projected.len() == 2 {
        let _ = write!(
            svg,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" stroke-dasharray=\"6 4\"/>",
            points_to_path(&layout.trend_projected),
            theme.trend_color
        );
    }

    for point in &layout.points {
        render_point(&mut svg, point, theme);
    }

    if let Some((cx, cy)) = layout.crossing_marker {
        let _ = write!(
            svg,
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{CROSSING_MARKER_RADIUS}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>",
            theme.reference_color
        );
    }

    for label in &layout.labels {
        if label.connector_length() >= CONNECTOR_MIN_LENGTH {
            let (ex, ey) = label.connector_end();
            let _ = write!(
                svg,
                "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{ex:.2}\" y2=\"{ey:.2}\" stroke=\"{}\" stroke-width=\"0.75\"/>",
                label.anchor_x, label.anchor_y, theme.axis_color
            );
        }
        let text = layout
            .points
            .get(label.point_index)
            .map(|p| p.name.as_str())
            .unwrap_or_default();
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{}\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            label.text_x,
            label.text_y,
            label.text_anchor.as_svg(),
            theme.font_family,
            layout.label_font_size,
            theme.text_color,
            escape_xml(text)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn render_axes(svg: &mut String, layout: &ChartLayout, theme: &Theme) {
    let plot = layout.plot;
    for tick in &layout.y_ticks {
        let _ = write!(
            svg,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
            plot.x,
            tick.pos,
            plot.right(),
            tick.pos,
            theme.grid_color
        );
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            plot.x - 8.0,
            tick.pos,
            theme.font_family,
            theme.font_size,
            theme.muted_text_color,
            escape_xml(&tick.label)
        );
    }
    for tick in &layout.x_ticks {
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            tick.pos,
            plot.bottom() + theme.font_size + 8.0,
            theme.font_family,
            theme.font_size,
            theme.muted_text_color,
            escape_xml(&tick.label)
        );
    }
    let _ = write!(
        svg,
        "<path d=\"M {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/>",
        plot.x,
        plot.y,
        plot.x,
        plot.bottom(),
        plot.right(),
        plot.bottom(),
        theme.axis_color
    );
}

fn render_point(svg: &mut String, point: &ChartPoint, theme: &Theme) {
    let fill = match point.kind {
        EntryKind::Bot => theme.family_color(point.family_index),
        EntryKind::Pro | EntryKind::Community => theme.human_color.as_str(),
    };
    let opacity = if point.active { 1.0 } else { theme.dimmed_opacity };
    let radius = if point.on_frontier { 4.5 } else { 3.5 };
    match point.kind {
        EntryKind::Bot => {
            let _ = write!(
                svg,
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius}\" fill=\"{fill}\" fill-opacity=\"{opacity}\"><title>{}</title></circle>",
                point.x,
                point.y,
                escape_xml(&point.name)
            );
        }
        EntryKind::Pro | EntryKind::Community => {
            // Human baselines are drawn as diamonds.
            let r = radius + 1.0;
            let _ = write!(
                svg,
                "<path d=\"M {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} Z\" fill=\"{fill}\" fill-opacity=\"{opacity}\"><title>{}</title></path>",
                point.x,
                point.y - r,
                point.x + r,
                point.y,
                point.x,
                point.y + r,
                point.x - r,
                point.y,
                escape_xml(&point.name)
            );
        }
    }
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let cmd = if idx == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd} {x:.2} {y:.2} ");
    }
    d.trim_end().to_string()
}

/// A best-so-far frontier holds its value until the next record, so it is
/// drawn as a step line.
fn step_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        if idx == 0 {
            let _ = write!(d, "M {x:.2} {y:.2}");
        } else {
            let _ = write!(d, " H {x:.2} V {y:.2}");
        }
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &RenderConfig,
    theme: &Theme,
) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = primary_font_family(&theme.font_family);
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let scale = render_cfg.png_scale.max(0.1);
    let size = tree.size().to_int_size().scale_by(scale).ok_or_else(|| {
        anyhow::anyhow!("Invalid PNG scale {scale}")
    })?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(
    _svg: &str,
    _output: &Path,
    _render_cfg: &RenderConfig,
    _theme: &Theme,
) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

#[cfg(feature = "png")]
fn primary_font_family(font_family: &str) -> String {
    font_family
        .split(',')
        .map(|part| part.trim().trim_matches('"').trim_matches('\''))
        .find(|part| !part.is_empty())
        .unwrap_or("sans-serif")
        .to_string()
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
