pub mod console;
pub mod markdown;

pub use console::{render_console, ColorMode};
pub use markdown::render_markdown;

use metriage_common::types::AnalysisReport;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn generated_at(report: &AnalysisReport) -> String {
    report.timestamp.format(TIMESTAMP_FORMAT).to_string()
}
