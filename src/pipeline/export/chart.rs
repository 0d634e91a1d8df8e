use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::domain::FlatRecord;
use crate::error::{PipelineError, Result};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const RADIUS: f64 = 220.0;
const CENTER: (f64, f64) = (WIDTH / 2.0, HEIGHT / 2.0 + 20.0);

// Categorical palette, cycled when there are more slices than colours
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
}

/// A pie chart of category counts, rendered as SVG.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<PieSlice>,
}

/// Counts of each non-null value in `column`, most frequent first; ties keep
/// first-appearance order.
pub fn value_counts(records: &[FlatRecord], column: &str) -> Vec<PieSlice> {
    let mut slices: Vec<PieSlice> = Vec::new();
    for value in records.iter().filter_map(|r| r.get_str(column)) {
        match slices.iter_mut().find(|s| s.label == value) {
            Some(slice) => slice.count += 1,
            None => slices.push(PieSlice {
                label: value.to_string(),
                count: 1,
            }),
        }
    }
    // stable sort keeps first-appearance order among equal counts
    slices.sort_by(|a, b| b.count.cmp(&a.count));
    slices
}

impl PieChart {
    pub fn new(title: impl Into<String>, slices: Vec<PieSlice>) -> Self {
        Self {
            title: title.into(),
            slices,
        }
    }

    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.count).sum()
    }

    /// Slice percentages in slice order.
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.slices
            .iter()
            .map(|s| s.count as f64 * 100.0 / total)
            .collect()
    }

    pub fn to_svg(&self) -> Result<String> {
        let total = self.total();
        if total == 0 {
            return Err(PipelineError::Chart("no values to plot".to_string()));
        }

        let mut svg = String::new();
        self.draw(&mut svg, total)
            .map_err(|e| PipelineError::Chart(e.to_string()))?;
        Ok(svg)
    }

    pub fn render_to_file(&self, path: &Path) -> Result<()> {
        let svg = self.to_svg()?;
        fs::write(path, svg).map_err(|e| PipelineError::io(path, e))
    }

    fn draw(&self, svg: &mut String, total: usize) -> std::fmt::Result {
        let (cx, cy) = CENTER;
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
        )?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            svg,
            r#"<text x="{cx}" y="40" text-anchor="middle" font-family="sans-serif" font-size="20">{}</text>"#,
            escape_xml(&self.title)
        )?;

        // Angles run counter-clockwise from 3 o'clock
        let mut start = 0.0_f64;
        for (i, (slice, pct)) in self.slices.iter().zip(self.percentages()).enumerate() {
            let sweep = 2.0 * PI * slice.count as f64 / total as f64;
            let end = start + sweep;
            let colour = PALETTE[i % PALETTE.len()];

            if slice.count == total {
                writeln!(svg, r#"<circle cx="{cx}" cy="{cy}" r="{RADIUS}" fill="{colour}"/>"#)?;
            } else {
                let (x1, y1) = polar(start, RADIUS);
                let (x2, y2) = polar(end, RADIUS);
                let large_arc = u8::from(sweep > PI);
                writeln!(
                    svg,
                    r#"<path d="M {cx:.2} {cy:.2} L {x1:.2} {y1:.2} A {RADIUS} {RADIUS} 0 {large_arc} 0 {x2:.2} {y2:.2} Z" fill="{colour}"/>"#
                )?;
            }

            let mid = start + sweep / 2.0;
            let (lx, ly) = polar(mid, RADIUS * 1.1);
            let anchor = if mid.cos() >= 0.0 { "start" } else { "end" };
            writeln!(
                svg,
                r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="{anchor}" dominant-baseline="middle" font-family="sans-serif" font-size="14">{}</text>"#,
                escape_xml(&slice.label)
            )?;
            let (px, py) = polar(mid, RADIUS * 0.6);
            writeln!(
                svg,
                r#"<text x="{px:.2}" y="{py:.2}" text-anchor="middle" dominant-baseline="middle" font-family="sans-serif" font-size="14">{pct:.1}%</text>"#
            )?;

            start = end;
        }

        writeln!(svg, "</svg>")
    }
}

fn polar(angle: f64, radius: f64) -> (f64, f64) {
    let (cx, cy) = CENTER;
    (cx + radius * angle.cos(), cy - radius * angle.sin())
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
