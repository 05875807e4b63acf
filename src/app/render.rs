use crate::core::{Listing, PriceSummary, SearchReport};
use crate::domain::model::format_price;
use std::fmt::Write as _;

const MAX_NAME_WIDTH: usize = 60;

fn fit_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_WIDTH {
        name.to_string()
    } else {
        let mut cut: String = name.chars().take(MAX_NAME_WIDTH - 3).collect();
        cut.push_str("...");
        cut
    }
}

/// Two aligned columns, `Name` and `Price`, with a separator row.
pub fn render_table(listings: &[Listing]) -> String {
    let rows: Vec<(String, String)> = listings
        .iter()
        .map(|l| (fit_name(&l.name), format_price(l.price)))
        .collect();

    let name_width = rows
        .iter()
        .map(|(n, _)| n.chars().count())
        .chain(std::iter::once("Name".len()))
        .max()
        .unwrap_or(4);
    let price_width = rows
        .iter()
        .map(|(_, p)| p.len())
        .chain(std::iter::once("Price".len()))
        .max()
        .unwrap_or(5);

    let mut table = String::new();
    let _ = writeln!(table, "{:<nw$} | {:>pw$}", "Name", "Price", nw = name_width, pw = price_width);
    let _ = writeln!(table, "{}-+-{}", "-".repeat(name_width), "-".repeat(price_width));
    for (name, price) in rows {
        let _ = writeln!(table, "{:<nw$} | {:>pw$}", name, price, nw = name_width, pw = price_width);
    }
    table
}

pub fn render_summary(summary: &PriceSummary) -> String {
    format!(
        "{} listings: lowest {}, highest {}, average {}, median {}",
        summary.count,
        format_price(summary.min),
        format_price(summary.max),
        format_price(summary.mean),
        format_price(summary.median)
    )
}

/// Text shown on stdout for a report. Warnings are not included.
pub fn render_report(report: &SearchReport) -> String {
    let mut out = String::new();
    if report.listings.is_empty() {
        return out;
    }

    let _ = writeln!(out, "Prices found for \"{}\" on {}\n", report.query, report.source);
    out.push_str(&render_table(&report.listings));
    if let Some(summary) = &report.summary {
        let _ = writeln!(out, "\n{}", render_summary(summary));
    }
    if let Some(recommendation) = &report.recommendation {
        let _ = writeln!(out, "\nPrice analysis and recommendation\n\n{}", recommendation);
    }
    out
}
