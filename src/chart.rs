use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt::Write;

use crate::profile::LanguageDistribution;

const RADIUS: f64 = 120.0;
const CENTER: f64 = 160.0;
const LEGEND_X: f64 = 340.0;
const WIDTH: f64 = 520.0;

const PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

/// Render the language distribution as a standalone SVG pie chart with a
/// legend. The distribution supplies only label → count pairs; slice order
/// follows the distribution's own order.
pub fn render_pie(distribution: &LanguageDistribution) -> String {
    let height = 320.0_f64.max(40.0 + distribution.len() as f64 * 24.0);
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}">"#
    );

    if distribution.is_empty() {
        let _ = writeln!(
            svg,
            r#"  <text x="{CENTER}" y="{CENTER}" text-anchor="middle" font-family="sans-serif" font-size="14">No language data</text>"#
        );
        svg.push_str("</svg>\n");
        return svg;
    }

    let total: u32 = distribution.iter().map(|(_, n)| n).sum();

    // A single slice would degenerate into a zero-length arc.
    if distribution.len() == 1 {
        let _ = writeln!(
            svg,
            r#"  <circle cx="{CENTER}" cy="{CENTER}" r="{RADIUS}" fill="{}"/>"#,
            PALETTE[0]
        );
    } else {
        let mut start = -FRAC_PI_2;
        for (i, (_, count)) in distribution.iter().enumerate() {
            let sweep = TAU * f64::from(count) / f64::from(total);
            let color = PALETTE[i % PALETTE.len()];
            let _ = writeln!(
                svg,
                r#"  <path d="{}" fill="{color}"/>"#,
                slice_path(start, start + sweep)
            );
            start += sweep;
        }
    }

    for (i, (language, count)) in distribution.iter().enumerate() {
        let y = 40.0 + i as f64 * 24.0;
        let color = PALETTE[i % PALETTE.len()];
        let _ = writeln!(
            svg,
            r#"  <rect x="{LEGEND_X}" y="{}" width="14" height="14" fill="{color}"/>"#,
            y - 11.0
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{y}" font-family="sans-serif" font-size="13">{} ({count})</text>"#,
            LEGEND_X + 22.0,
            escape(language)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Pie slice from `start` to `end` radians, angles measured from 12 o'clock.
fn slice_path(start: f64, end: f64) -> String {
    let (x0, y0) = rim_point(start);
    let (x1, y1) = rim_point(end);
    let large_arc = i32::from(end - start > PI);
    format!(
        "M{CENTER:.2} {CENTER:.2} L{x0:.2} {y0:.2} A{RADIUS:.2} {RADIUS:.2} 0 {large_arc} 1 {x1:.2} {y1:.2} Z"
    )
}

fn rim_point(angle: f64) -> (f64, f64) {
    (
        CENTER + RADIUS * angle.cos(),
        CENTER + RADIUS * angle.sin(),
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}
