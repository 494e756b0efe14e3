//! HTML page rendering for the published site
//!
//! Pages are built by string concatenation against a fixed template; every
//! dynamic value comes from the record snapshot, so output is deterministic.
//! All links are relative and resolve within the generated tree.

use std::fmt::Write;

use crate::data::{CheckIn, MeasureKind};
use crate::progress::GoalProgress;

/// Shared stylesheet written to assets/style.css
pub const STYLESHEET: &str = r#"body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; max-width: 880px; margin: 0 auto; padding: 24px; line-height: 1.6; color: #1f2937; }
h1, h2 { color: #111827; }
a { color: #2563eb; text-decoration: none; }
a:hover { text-decoration: underline; }
.goal-card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 16px 20px; margin-bottom: 16px; }
.goal-card h2 { margin: 0 0 4px 0; font-size: 18px; }
.kind { display: inline-block; padding: 2px 10px; border-radius: 10px; font-size: 12px; background: #eef2ff; color: #3730a3; margin-left: 8px; }
.meter { background: #f3f4f6; border-radius: 6px; height: 10px; overflow: hidden; margin-top: 8px; }
.meter > div { background: #2563eb; height: 100%; }
.meter.done > div { background: #059669; }
.pct { color: #6b7280; font-size: 14px; }
.archived-list { color: #6b7280; }
.archived-list a { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin-top: 12px; }
th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #e5e7eb; font-size: 14px; }
th { color: #6b7280; font-weight: 600; }
.note { color: #6b7280; }
.chart { margin: 16px 0; }
.footer { margin-top: 32px; color: #9ca3af; font-size: 13px; }
"#;

/// Minimal HTML escaping for text interpolated into pages.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the overview page listing all active goals.
///
/// Archived goals appear in a separate link-only section so their history
/// stays reachable without cluttering the active listing. `last_updated` is
/// derived from the record itself, never from the wall clock at build time.
pub fn render_overview(progress: &[GoalProgress], last_updated: Option<&str>) -> String {
    let mut html = page_head("Goals", "assets/style.css");
    html.push_str("<h1>Goals</h1>\n");

    let active: Vec<&GoalProgress> = progress.iter().filter(|p| !p.archived).collect();
    let archived: Vec<&GoalProgress> = progress.iter().filter(|p| p.archived).collect();

    if active.is_empty() {
        html.push_str("<p>No active goals yet.</p>\n");
    }

    for gp in &active {
        let pct = gp.percent.unwrap_or(0.0);
        let done_class = if gp.is_done() { " done" } else { "" };
        let _ = write!(
            html,
            "<div class=\"goal-card\">\n\
             <h2><a href=\"goals/{slug}/index.html\">{title}</a>\
             <span class=\"kind\">{kind}</span></h2>\n\
             <span class=\"pct\">{summary}</span>\n\
             <div class=\"meter{done_class}\"><div style=\"width: {pct:.1}%\"></div></div>\n\
             </div>\n",
            slug = gp.slug,
            title = escape(&gp.title),
            kind = gp.kind.label(),
            summary = escape(&progress_summary(gp)),
        );
    }

    if !archived.is_empty() {
        html.push_str("<h2>Archived</h2>\n<ul class=\"archived-list\">\n");
        for gp in &archived {
            let _ = write!(
                html,
                "<li><a href=\"goals/{slug}/index.html\">{title}</a></li>\n",
                slug = gp.slug,
                title = escape(&gp.title),
            );
        }
        html.push_str("</ul>\n");
    }

    if let Some(marker) = last_updated {
        let _ = write!(
            html,
            "<p class=\"footer\">Last updated {}</p>\n",
            escape(marker)
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render the detail page for one goal: description, chart, and the full
/// check-in history.
pub fn render_goal_page(gp: &GoalProgress, check_ins: &[&CheckIn]) -> String {
    let mut html = page_head(&gp.title, "../../assets/style.css");
    html.push_str("<p><a href=\"../../index.html\">&larr; All goals</a></p>\n");
    let _ = write!(
        html,
        "<h1>{title}<span class=\"kind\">{kind}</span></h1>\n",
        title = escape(&gp.title),
        kind = gp.kind.label(),
    );

    if gp.archived {
        html.push_str("<p class=\"note\">This goal is archived.</p>\n");
    }

    if !gp.description.is_empty() {
        let _ = write!(html, "<p>{}</p>\n", escape(&gp.description));
    }

    let _ = write!(
        html,
        "<p class=\"pct\">{}</p>\n",
        escape(&progress_summary(gp))
    );

    html.push_str("<div class=\"chart\"><img src=\"chart.svg\" alt=\"Progress chart\" width=\"640\" height=\"320\"></div>\n");

    html.push_str("<h2>Check-ins</h2>\n");
    if check_ins.is_empty() {
        html.push_str("<p>No check-ins recorded.</p>\n");
    } else {
        html.push_str("<table>\n<tr><th>Date</th><th>Value</th><th>Note</th></tr>\n");
        for c in check_ins {
            let _ = write!(
                html,
                "<tr><td>{date}</td><td>{value}</td><td class=\"note\">{note}</td></tr>\n",
                date = c.date,
                value = display_check_in_value(gp.kind, c.value),
                note = escape(c.note.as_deref().unwrap_or("")),
            );
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn page_head(title: &str, css_href: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"{css_href}\">\n\
         </head>\n<body>\n",
        title = escape(title),
    )
}

/// One-line progress summary, e.g. "9 / 12 books (75%)" or "Done".
fn progress_summary(gp: &GoalProgress) -> String {
    match gp.kind {
        MeasureKind::Binary => {
            if gp.is_done() {
                "Done (100%)".to_string()
            } else if gp.check_in_count == 0 {
                "Not started".to_string()
            } else {
                "Not done yet (0%)".to_string()
            }
        }
        MeasureKind::Numeric => {
            let current = gp.current.unwrap_or(0.0);
            let target = gp.target.unwrap_or(0.0);
            let unit = gp
                .unit
                .as_deref()
                .map(|u| format!(" {u}"))
                .unwrap_or_default();
            format!(
                "{} / {}{unit} ({}%)",
                fmt_number(current),
                fmt_number(target),
                fmt_number(gp.percent.unwrap_or(0.0)),
            )
        }
        MeasureKind::Percent => format!("{}%", fmt_number(gp.percent.unwrap_or(0.0))),
    }
}

fn display_check_in_value(kind: MeasureKind, value: f64) -> String {
    match kind {
        MeasureKind::Binary => {
            if value == 1.0 {
                "done".to_string()
            } else {
                "not done".to_string()
            }
        }
        MeasureKind::Percent => format!("{}%", fmt_number(value)),
        MeasureKind::Numeric => {
            if value >= 0.0 {
                format!("+{}", fmt_number(value))
            } else {
                fmt_number(value)
            }
        }
    }
}

fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
