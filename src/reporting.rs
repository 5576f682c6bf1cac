//! Human-readable episode summaries and metric tables.

use std::fmt;

use crate::metrics::{METRIC_KEYS, MetricsReport};
use crate::runner::Evaluation;

/// Printable verdict for one scenario/controller run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub scenario: String,
    pub controller: String,
    pub steps: usize,
    pub reason: String,
    pub controller_faults: usize,
    pub success: bool,
}

impl RunSummary {
    pub fn from_evaluation(scenario: &str, controller: &str, eval: &Evaluation) -> Self {
        // The initial reset record is not a step.
        let steps = eval.episode.records.len().saturating_sub(1);
        Self {
            scenario: scenario.to_string(),
            controller: controller.to_string(),
            steps,
            reason: eval.episode.reason.to_string(),
            controller_faults: eval.episode.controller_faults,
            success: eval.success,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Report ---")?;
        writeln!(f, "Scenario:          {}", self.scenario)?;
        writeln!(f, "Controller:        {}", self.controller)?;
        writeln!(f, "Steps:             {}", self.steps)?;
        writeln!(f, "Outcome:           {}", self.reason)?;
        writeln!(f, "Controller faults: {}", self.controller_faults)?;
        write!(
            f,
            "Verdict:           {}",
            if self.success { "SUCCESS" } else { "FAILURE" }
        )
    }
}

/// Renders the metric table in the engine's canonical key order, printing
/// undefined values as `undefined`.
pub fn metrics_table(report: &MetricsReport) -> String {
    let values = report.values();
    let mut out = String::from("--- Metrics ---\n");
    for key in METRIC_KEYS {
        let value = values[key];
        if value.is_nan() {
            out.push_str(&format!("{key:<42} undefined\n"));
        } else {
            out.push_str(&format!("{key:<42} {value:.6}\n"));
        }
    }
    out
}
