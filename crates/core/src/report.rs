//! Human-readable run reports. Pure formatting, no I/O.

use std::fmt::Write;

use crate::outcome::{ImportOutcome, ImportRun, RunSummary};

/// Render a finished run: one line per record, then the counts block.
pub fn render_report(run: &ImportRun) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Import into \"{}\"", run.table);
    for record in &run.outcomes {
        let _ = match &record.outcome {
            ImportOutcome::Inserted => writeln!(out, "  + {}  inserted", record.natural_key),
            ImportOutcome::SkippedDuplicate => {
                writeln!(out, "  = {}  skipped (already present)", record.natural_key)
            }
            ImportOutcome::Failed(reason) => {
                writeln!(out, "  ! {}  failed: {reason}", record.natural_key)
            }
        };
    }
    out.push('\n');
    write_counts(&mut out, &run.summary);

    out
}

/// Render a summary from a run that ended early. Informational only.
pub fn render_partial(summary: &RunSummary, total: Option<usize>) -> String {
    let mut out = String::from("Partial import summary (run did not complete; counts are informational)\n");
    if let Some(total) = total {
        let _ = writeln!(out, "  processed:  {} of {total}", summary.processed());
    }
    write_counts(&mut out, summary);
    out
}

fn write_counts(out: &mut String, summary: &RunSummary) {
    let _ = writeln!(out, "  rows before: {}", summary.pre_count);
    let _ = writeln!(out, "  inserted:    {}", summary.inserted);
    let _ = writeln!(out, "  skipped:     {}", summary.skipped);
    let _ = writeln!(out, "  failed:      {}", summary.failed);

    match summary.post_count {
        Some(post) => {
            let _ = writeln!(out, "  rows after:  {post}");
            if summary.counts_consistent() == Some(false) {
                let _ = writeln!(
                    out,
                    "  note: expected {} rows after import; another writer may have modified the table",
                    summary.expected_post_count()
                );
            }
        }
        None => {
            let _ = writeln!(out, "  rows after:  (not sampled)");
        }
    }
}
