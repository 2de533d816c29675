use comfy_table::{Cell, CellAlignment, Color, Table};
use console::style;

use crate::models::{MultiCloudReport, ProviderResult};
use crate::probes::catalog::label_for;

const RULE_WIDTH: usize = 80;

/// `1234567` -> `1,234,567`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Bordered table whose last column is right-aligned.
fn count_table(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
    let mut table = Table::new();
    if !console::colors_enabled() {
        table.force_no_tty();
    }
    table.set_header(headers.to_vec());
    for row in rows {
        table.add_row(row);
    }
    if let Some(column) = table.column_mut(headers.len().saturating_sub(1)) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

/// Human-readable summary printed after a run.
pub fn render_table(report: &MultiCloudReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", style(&rule).cyan()));
    out.push_str(&format!("{}\n", style("Multi-Cloud Compute Node Summary").cyan().bold()));
    out.push_str(&format!("{}\n\n", style(&rule).cyan()));

    let errors = report.errors();
    if !errors.is_empty() {
        out.push_str(&format!("{}\n", style("Errors encountered:").yellow()));
        for error in &errors {
            out.push_str(&format!("  {}\n", style(format!("\u{2022} {}", error)).red()));
        }
        out.push('\n');
    }

    let warnings = report.warnings();
    if !warnings.is_empty() {
        out.push_str(&format!("{}\n", style("Warnings:").yellow()));
        for warning in &warnings {
            out.push_str(&format!("  \u{2022} {}\n", warning));
        }
        out.push('\n');
    }

    let mut detail: Vec<Vec<Cell>> = Vec::new();
    for summary in report.providers.iter().filter_map(ProviderResult::summary) {
        for total in summary.by_resource() {
            detail.push(vec![
                Cell::new(summary.provider),
                Cell::new(label_for(&total.resource_type)),
                Cell::new(format_count(total.count)),
            ]);
        }
    }

    if detail.is_empty() {
        out.push_str(&format!(
            "{}\n\n",
            style("No compute resources found across any provider.").yellow()
        ));
    } else {
        out.push_str(&format!("{}\n", style("Detailed Breakdown:").green()));
        out.push_str(&format!("{}\n", count_table(&["Provider", "Resource Type", "Count"], detail)));

        let totals: Vec<Vec<Cell>> = report
            .providers
            .iter()
            .map(|p| {
                let total = match p {
                    ProviderResult::Completed(s) => Cell::new(format_count(s.total_count())),
                    ProviderResult::Failed(_) => Cell::new("failed").fg(Color::Red),
                };
                vec![Cell::new(p.provider()), total]
            })
            .collect();
        out.push_str(&format!("\n{}\n", style("Provider Totals:").green()));
        out.push_str(&format!("{}\n", count_table(&["Provider", "Total Nodes"], totals)));
    }

    out.push_str(&format!("\n{}\n", style(&rule).green()));
    out.push_str(&format!(
        "{}\n",
        style(format!(
            "Grand Total Across All Clouds: {} compute nodes",
            format_count(report.grand_total())
        ))
        .green()
        .bold()
    ));
    out.push_str(&format!("{}\n", style(&rule).green()));
    out
}
