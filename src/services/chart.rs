use std::fmt::Write;

use crate::models::EquityPoint;

pub const CHART_WIDTH: f64 = 800.0;
pub const CHART_HEIGHT: f64 = 300.0;
const PADDING: f64 = 24.0;

/// Screen coordinates for each point, oldest on the left, highest value at the top.
fn project(points: &[EquityPoint], width: f64, height: f64) -> Vec<(f64, f64)> {
    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.value), hi.max(p.value)));
    // A flat series would divide by zero; draw it along the middle instead.
    let span = if max > min { max - min } else { 1.0 };
    let plot_w = width - 2.0 * PADDING;
    let plot_h = height - 2.0 * PADDING;
    let step = if points.len() > 1 { plot_w / (points.len() - 1) as f64 } else { 0.0 };

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = PADDING + step * i as f64;
            let y = if max > min {
                PADDING + plot_h - (p.value - min) / span * plot_h
            } else {
                PADDING + plot_h / 2.0
            };
            (x, y)
        })
        .collect()
}

/// Inline SVG with a filled area under the value line. Empty input renders a placeholder.
pub fn render_equity_chart(points: &[EquityPoint]) -> String {
    if points.is_empty() {
        return r#"<p class="chart-empty">No performance history available.</p>"#.to_string();
    }

    let coords = project(points, CHART_WIDTH, CHART_HEIGHT);
    let baseline = CHART_HEIGHT - PADDING;

    let mut line = String::new();
    for (i, (x, y)) in coords.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(line, "{}{:.1},{:.1} ", cmd, x, y);
    }
    let line = line.trim_end().to_string();

    let (first_x, _) = coords[0];
    let (last_x, _) = coords[coords.len() - 1];
    let area = format!("{} L{:.1},{:.1} L{:.1},{:.1} Z", line, last_x, baseline, first_x, baseline);

    let rising = points[points.len() - 1].value >= points[0].value;
    let color = if rising { "#2e7d32" } else { "#c62828" };

    let first = points[0].date.format("%Y-%m-%d");
    let last = points[points.len() - 1].date.format("%Y-%m-%d");

    format!(
        concat!(
            r#"<svg class="equity-chart" viewBox="0 0 {w} {h}" width="100%" role="img" aria-label="Portfolio value from {first} to {last}">"#,
            r#"<path class="area" d="{area}" fill="{color}" fill-opacity="0.15" stroke="none"/>"#,
            r#"<path class="line" d="{line}" fill="none" stroke="{color}" stroke-width="2"/>"#,
            r#"<text x="{pad}" y="{label_y}" font-size="12">{first}</text>"#,
            r#"<text x="{right}" y="{label_y}" font-size="12" text-anchor="end">{last}</text>"#,
            "</svg>"
        ),
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        first = first,
        last = last,
        area = area,
        line = line,
        color = color,
        pad = PADDING,
        right = CHART_WIDTH - PADDING,
        label_y = CHART_HEIGHT - 4.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn points(values: &[f64]) -> Vec<EquityPoint> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| EquityPoint::new(start + chrono::Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_empty_series_renders_placeholder() {
        let html = render_equity_chart(&[]);
        assert!(html.contains("No performance history"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_projection_maps_extremes_to_plot_edges() {
        let coords = project(&points(&[10.0, 20.0, 15.0]), 200.0, 100.0);
        assert_eq!(coords[0], (PADDING, 100.0 - PADDING));
        assert_eq!(coords[1], (100.0, PADDING));
        assert_eq!(coords[2].0, 200.0 - PADDING);
    }

    #[test]
    fn test_flat_series_is_drawn_mid_height() {
        let coords = project(&points(&[5.0, 5.0]), 200.0, 100.0);
        assert!(coords.iter().all(|&(_, y)| (y - 50.0).abs() < 1e-9));
    }

    #[test]
    fn test_svg_contains_line_and_area() {
        let html = render_equity_chart(&points(&[100.0, 90.0, 95.0]));
        assert!(html.starts_with("<svg"));
        assert!(html.contains(r#"class="line""#));
        assert!(html.contains(r#"class="area""#));
        assert!(html.contains("2025-01-01"));
        assert!(html.contains("2025-01-03"));
        // ended below the start
        assert!(html.contains("#c62828"));
    }
}
