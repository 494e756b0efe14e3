//! Deterministic SVG chart rendering
//!
//! Charts are plain SVG text built from the aggregate series, so identical
//! input always produces byte-identical output. Layout is fixed: same
//! canvas, same padding, and a fixed y-axis policy per measurement kind so
//! charts stay visually comparable across rebuilds:
//! - Binary: y in [0, 1]
//! - Percent: y in [0, 100]
//! - Numeric: y in [0, max(target, final total)]

use chrono::NaiveDate;
use std::fmt::Write;

use crate::data::MeasureKind;
use crate::progress::GoalProgress;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 320.0;
const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 24.0;
const PAD_TOP: f64 = 24.0;
const PAD_BOTTOM: f64 = 40.0;

/// Render a progress chart for one goal as an SVG document.
pub fn render_chart(progress: &GoalProgress) -> String {
    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {WIDTH} {HEIGHT}\" \
         width=\"{WIDTH}\" height=\"{HEIGHT}\" role=\"img\">\n"
    );
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    let y_max = y_axis_max(progress);
    draw_frame(&mut svg, y_max, progress.kind);

    if let Some(target) = progress.target.filter(|t| *t > 0.0) {
        draw_target_line(&mut svg, target, y_max);
    }

    if progress.series.is_empty() {
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" \
             font-family=\"sans-serif\" font-size=\"14\" fill=\"#9ca3af\">No check-ins yet</text>\n",
            x = fmt(WIDTH / 2.0),
            y = fmt(HEIGHT / 2.0),
        );
    } else {
        draw_series(&mut svg, &progress.series, y_max);
    }

    svg.push_str("</svg>\n");
    svg
}

fn y_axis_max(progress: &GoalProgress) -> f64 {
    match progress.kind {
        MeasureKind::Binary => 1.0,
        MeasureKind::Percent => 100.0,
        MeasureKind::Numeric => {
            let final_value = progress.series.last().map(|&(_, v)| v).unwrap_or(0.0);
            let target = progress.target.unwrap_or(0.0);
            let max = target.max(final_value);
            if max > 0.0 {
                max
            } else {
                1.0
            }
        }
    }
}

fn draw_frame(svg: &mut String, y_max: f64, kind: MeasureKind) {
    let plot_bottom = HEIGHT - PAD_BOTTOM;
    let plot_right = WIDTH - PAD_RIGHT;

    // Axes
    let _ = write!(
        svg,
        "<line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"#d1d5db\" stroke-width=\"1\"/>\n\
         <line x1=\"{l}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#d1d5db\" stroke-width=\"1\"/>\n",
        l = fmt(PAD_LEFT),
        t = fmt(PAD_TOP),
        b = fmt(plot_bottom),
        r = fmt(plot_right),
    );

    // Horizontal gridlines with labels at quarters of the axis
    let ticks: &[f64] = match kind {
        MeasureKind::Binary => &[0.0, 1.0],
        _ => &[0.0, 0.25, 0.5, 0.75, 1.0],
    };
    for tick in ticks {
        let value = y_max * tick;
        let y = plot_bottom - (plot_bottom - PAD_TOP) * tick;
        let _ = write!(
            svg,
            "<line x1=\"{l}\" y1=\"{y}\" x2=\"{r}\" y2=\"{y}\" stroke=\"#f3f4f6\" stroke-width=\"1\"/>\n\
             <text x=\"{lx}\" y=\"{ly}\" text-anchor=\"end\" font-family=\"sans-serif\" \
             font-size=\"11\" fill=\"#6b7280\">{label}</text>\n",
            l = fmt(PAD_LEFT),
            r = fmt(WIDTH - PAD_RIGHT),
            y = fmt(y),
            lx = fmt(PAD_LEFT - 8.0),
            ly = fmt(y + 4.0),
            label = fmt_value(value),
        );
    }
}

fn draw_target_line(svg: &mut String, target: f64, y_max: f64) {
    let y = value_to_y(target, y_max);
    let _ = write!(
        svg,
        "<line x1=\"{l}\" y1=\"{y}\" x2=\"{r}\" y2=\"{y}\" stroke=\"#f59e0b\" \
         stroke-width=\"1\" stroke-dasharray=\"6 4\"/>\n",
        l = fmt(PAD_LEFT),
        r = fmt(WIDTH - PAD_RIGHT),
        y = fmt(y),
    );
}

fn draw_series(svg: &mut String, series: &[(NaiveDate, f64)], y_max: f64) {
    let first = series[0].0;
    let last = series[series.len() - 1].0;
    let span_days = (last - first).num_days().max(1) as f64;

    let points: Vec<(f64, f64)> = series
        .iter()
        .map(|&(date, value)| {
            let frac = if series.len() == 1 {
                0.5
            } else {
                (date - first).num_days() as f64 / span_days
            };
            let x = PAD_LEFT + (WIDTH - PAD_LEFT - PAD_RIGHT) * frac;
            (x, value_to_y(value, y_max))
        })
        .collect();

    if points.len() > 1 {
        let path: Vec<String> = points
            .iter()
            .map(|&(x, y)| format!("{},{}", fmt(x), fmt(y)))
            .collect();
        let _ = write!(
            svg,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"#2563eb\" stroke-width=\"2\"/>\n",
            path.join(" ")
        );
    }

    for &(x, y) in &points {
        let _ = write!(
            svg,
            "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"3\" fill=\"#2563eb\"/>\n",
            cx = fmt(x),
            cy = fmt(y),
        );
    }

    // Date labels at the ends of the series
    let label_y = HEIGHT - PAD_BOTTOM + 18.0;
    let _ = write!(
        svg,
        "<text x=\"{x}\" y=\"{y}\" text-anchor=\"start\" font-family=\"sans-serif\" \
         font-size=\"11\" fill=\"#6b7280\">{first}</text>\n",
        x = fmt(PAD_LEFT),
        y = fmt(label_y),
    );
    if last != first {
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"end\" font-family=\"sans-serif\" \
             font-size=\"11\" fill=\"#6b7280\">{last}</text>\n",
            x = fmt(WIDTH - PAD_RIGHT),
            y = fmt(label_y),
        );
    }
}

fn value_to_y(value: f64, y_max: f64) -> f64 {
    let plot_bottom = HEIGHT - PAD_BOTTOM;
    let frac = (value / y_max).clamp(0.0, 1.0);
    plot_bottom - (plot_bottom - PAD_TOP) * frac
}

/// Fixed-precision coordinate formatting keeps output byte-stable.
fn fmt(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
