use crate::generated_at;
use metriage_common::types::{AnalysisReport, EvaluationResult, Status};

const TEMPLATE: &str = include_str!("templates/report.md");

fn issue_section(title: &str, results: &[&EvaluationResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut section = format!("## {title}\n\n");
    for r in results {
        section.push_str(&format!("### {}\n\n", r.rule_name));
        section.push_str(&format!("**Status:** {}\n", r.status));
        section.push_str(&format!("**Message:** {}\n", r.message));
        if !r.details.is_empty() {
            section.push_str("**Details:**\n");
            for detail in &r.details {
                section.push_str(&format!("- {detail}\n"));
            }
        }
        if !r.potential_action_user.is_empty() {
            section.push_str(&format!("**Potential action:** {}\n", r.potential_action_user));
        }
        if !r.potential_action_developer.is_empty() {
            section.push_str(&format!(
                "**Potential action (developer):** {}\n",
                r.potential_action_developer
            ));
        }
        section.push('\n');
    }
    section
}

fn healthy_section(results: &[&EvaluationResult]) -> String {
    if results.is_empty() {
        return String::new();
    }
    let mut section = String::from("## 🟢 Healthy Metrics\n\n");
    for r in results {
        section.push_str(&format!("- **{}:** {}\n", r.rule_name, r.message));
    }
    section
}

/// Markdown rendering of a report, built from the embedded template.
pub fn render_markdown(report: &AnalysisReport) -> String {
    let red = report.results_with_status(Status::Red);
    let yellow = report.results_with_status(Status::Yellow);
    let green = report.results_with_status(Status::Green);

    let rendered = TEMPLATE
        .replace("{{cluster_name}}", &report.cluster_name)
        .replace("{{acs_version}}", &report.acs_version)
        .replace("{{load_level}}", &report.load_level.to_string())
        .replace("{{generated}}", &generated_at(report))
        .replace("{{red_count}}", &report.summary.red_count.to_string())
        .replace("{{yellow_count}}", &report.summary.yellow_count.to_string())
        .replace("{{green_count}}", &report.summary.green_count.to_string())
        .replace("{{critical_section}}", &issue_section("🔴 Critical Issues", &red))
        .replace("{{warning_section}}", &issue_section("🟡 Warnings", &yellow))
        .replace("{{healthy_section}}", &healthy_section(&green));

    format!("{}\n", rendered.trim_end())
}
