use crate::generated_at;
use colored::{ColoredString, Colorize};
use metriage_common::types::{AnalysisReport, EvaluationResult, Status, Summary};
use std::fmt::Write;

/// Whether ANSI colors are emitted. HTTP responses use `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Colored,
    Plain,
}

#[derive(Clone, Copy)]
struct Painter(ColorMode);

impl Painter {
    fn paint(self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        match self.0 {
            ColorMode::Colored => style(text).to_string(),
            ColorMode::Plain => text.to_string(),
        }
    }
}

fn percent(count: usize, total: usize) -> f64 {
    count as f64 / total as f64 * 100.0
}

fn write_summary(out: &mut String, summary: &Summary, p: Painter) {
    out.push_str(&p.paint("Summary", |s| s.bold()));
    out.push('\n');
    let _ = writeln!(out, "  {:<8} {:>6} {:>11}", "Status", "Count", "Percentage");

    let total = summary.total_analyzed;
    if total == 0 {
        out.push_str("  (no rules evaluated)\n\n");
        return;
    }

    let rows: [(&str, usize, fn(&str) -> ColoredString); 3] = [
        ("RED", summary.red_count, |s| s.red()),
        ("YELLOW", summary.yellow_count, |s| s.yellow()),
        ("GREEN", summary.green_count, |s| s.green()),
    ];
    for (label, count, style) in rows {
        let _ = writeln!(
            out,
            "  {} {:>6} {:>10.1}%",
            p.paint(&format!("{label:<8}"), style),
            count,
            percent(count, total)
        );
    }
    out.push('\n');
}

fn write_issue(out: &mut String, result: &EvaluationResult, p: Painter) {
    out.push_str(&p.paint(&result.rule_name, |s| s.bold()));
    out.push('\n');
    let status_line = format!("  Status: {}", result.status);
    let status_line = match result.status {
        Status::Red => p.paint(&status_line, |s| s.red()),
        _ => p.paint(&status_line, |s| s.yellow()),
    };
    let _ = writeln!(out, "{status_line}");
    let _ = writeln!(out, "  Message: {}", result.message);

    if !result.details.is_empty() {
        let _ = writeln!(out, "{}", p.paint("  Details:", |s| s.yellow()));
        for detail in &result.details {
            let _ = writeln!(out, "    {detail}");
        }
    }
    if !result.potential_action_user.is_empty() {
        let _ = writeln!(
            out,
            "  {} {}",
            p.paint("Potential action:", |s| s.yellow()),
            result.potential_action_user
        );
    }
    if !result.potential_action_developer.is_empty() {
        let _ = writeln!(
            out,
            "  {} {}",
            p.paint("Potential action (developer):", |s| s.yellow()),
            result.potential_action_developer
        );
    }
    out.push('\n');
}

/// Terminal rendering of a report: header, summary table, detailed RED and
/// YELLOW sections, then one line per GREEN result.
pub fn render_console(report: &AnalysisReport, mode: ColorMode) -> String {
    let p = Painter(mode);
    let mut out = String::new();

    out.push_str(&p.paint("Automated Metrics Analysis Report", |s| s.bold()));
    out.push_str("\n\n");
    let _ = writeln!(out, "Cluster: {}", report.cluster_name);
    let _ = writeln!(out, "ACS Version: {}", report.acs_version);
    let _ = writeln!(out, "Load Level: {}", report.load_level);
    let _ = writeln!(out, "Generated: {}\n", generated_at(report));

    write_summary(&mut out, &report.summary, p);

    let red = report.results_with_status(Status::Red);
    if !red.is_empty() {
        out.push_str(&p.paint("🔴 Critical Issues", |s| s.red().bold()));
        out.push_str("\n\n");
        for result in red {
            write_issue(&mut out, result, p);
        }
    }

    let yellow = report.results_with_status(Status::Yellow);
    if !yellow.is_empty() {
        out.push_str(&p.paint("🟡 Warnings", |s| s.yellow().bold()));
        out.push_str("\n\n");
        for result in yellow {
            write_issue(&mut out, result, p);
        }
    }

    let green = report.results_with_status(Status::Green);
    if !green.is_empty() {
        out.push_str(&p.paint("🟢 Healthy Metrics", |s| s.green().bold()));
        out.push_str("\n\n");
        for result in green {
            let _ = writeln!(
                out,
                "{}{}: {}",
                p.paint("  ✓ ", |s| s.green()),
                result.rule_name,
                result.message
            );
        }
    }

    out
}
