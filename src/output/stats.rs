//! Run summary reporting
//!
//! This module turns a [`RunReport`] into the summary shown at the end of a
//! run.

use crate::crawler::{ProfileOutcome, RunReport};
use std::fmt::Write;

/// Formats the per-profile results of a run
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Harvest Summary ===\n");
    let _ = writeln!(out, "Profiles:");
    for entry in &report.profiles {
        match &entry.outcome {
            ProfileOutcome::Harvested {
                records,
                failures,
                out_of_range,
            } => {
                let _ = writeln!(
                    out,
                    "  {}: {} posts ({} failed, {} outside range)",
                    entry.profile, records, failures, out_of_range
                );
            }
            ProfileOutcome::Failed(e) => {
                let _ = writeln!(out, "  {}: FAILED - {}", entry.profile, e);
            }
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Total posts: {}", report.records.len());
    let _ = writeln!(
        out,
        "Profiles succeeded: {} / {}",
        report.succeeded(),
        report.profiles.len()
    );
    if report.halted {
        let _ = writeln!(out, "Run halted after the first failed profile");
    }

    out
}

/// Prints the run summary to stdout
pub fn print_report(report: &RunReport) {
    print!("{}", format_report(report));
}
