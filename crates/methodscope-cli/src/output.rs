use std::io::Write;
use std::path::Path;

use methodscope_core::{CriterionOutcome, Criterion, ProgressEvent, RunSummary};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print a real-time progress event.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::DocumentStarted {
            index,
            total,
            filename,
        } => {
            writeln!(w, "[{}/{}] Evaluating {}", index + 1, total, filename)?;
        }
        ProgressEvent::DocumentSkipped {
            index,
            total,
            filename,
            error,
        } => {
            let msg = format!("skipped {} ({})", filename, truncate(error, 80));
            if color.enabled() {
                writeln!(w, "[{}/{}] {} {}", index + 1, total, "WARNING:".yellow(), msg)?;
            } else {
                writeln!(w, "[{}/{}] WARNING: {}", index + 1, total, msg)?;
            }
        }
        ProgressEvent::CriterionStarted { .. } => {
            // Finished line carries the criterion name
        }
        ProgressEvent::CriterionFinished {
            criterion, outcome, ..
        } => match outcome {
            CriterionOutcome::Done { evaluation } => {
                if color.enabled() {
                    writeln!(w, "    {} -> {}", criterion, colored_label(evaluation))?;
                } else {
                    writeln!(w, "    {} -> {}", criterion, evaluation)?;
                }
            }
            CriterionOutcome::InitialCallFailed { error } => {
                let msg = format!("MODEL ERROR ({})", truncate(error, 60));
                if color.enabled() {
                    writeln!(w, "    {} -> {}", criterion, msg.red())?;
                } else {
                    writeln!(w, "    {} -> {}", criterion, msg)?;
                }
            }
            CriterionOutcome::DetailedSkipped { error } => {
                let msg = format!("UNPARSED ({})", truncate(error, 60));
                if color.enabled() {
                    writeln!(w, "    {} -> {}", criterion, msg.yellow())?;
                } else {
                    writeln!(w, "    {} -> {}", criterion, msg)?;
                }
            }
            CriterionOutcome::DetailedCallFailed { evaluation, error } => {
                let msg = format!("{}, follow-up failed ({})", evaluation, truncate(error, 60));
                if color.enabled() {
                    writeln!(w, "    {} -> {}", criterion, msg.yellow())?;
                } else {
                    writeln!(w, "    {} -> {}", criterion, msg)?;
                }
            }
        },
        ProgressEvent::DocumentFinished {
            index,
            total,
            filename,
            records,
        } => {
            let msg = format!("{} done ({} records)", filename, records);
            if color.enabled() {
                writeln!(w, "[{}/{}] {}", index + 1, total, msg.dimmed())?;
            } else {
                writeln!(w, "[{}/{}] {}", index + 1, total, msg)?;
            }
        }
    }
    Ok(())
}

fn colored_label(evaluation: &str) -> String {
    match evaluation.chars().next() {
        Some('2') => evaluation.green().to_string(),
        Some('1') => evaluation.yellow().to_string(),
        Some('0') => evaluation.red().to_string(),
        _ => evaluation.to_string(),
    }
}

/// Print the end-of-run summary.
pub fn print_run_summary(
    w: &mut dyn Write,
    summary: &RunSummary,
    output: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }

    writeln!(w, "  Model: {}", summary.model)?;
    writeln!(w, "  Documents found: {}", summary.documents_found)?;
    writeln!(w, "  Documents evaluated: {}", summary.documents_evaluated)?;
    if summary.documents_incomplete > 0 {
        writeln!(
            w,
            "  Documents cut off by cancellation: {}",
            summary.documents_incomplete
        )?;
    }
    if !summary.documents_skipped.is_empty() {
        let msg = format!("Documents skipped: {}", summary.documents_skipped.len());
        if color.enabled() {
            writeln!(w, "  {}", msg.yellow())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
        for skipped in &summary.documents_skipped {
            writeln!(w, "    - {}: {}", skipped.filename, truncate(&skipped.error, 70))?;
        }
    }
    writeln!(w, "  Records written: {}", summary.records)?;
    if summary.cancelled {
        let msg = "Run cancelled; results are partial";
        if color.enabled() {
            writeln!(w, "  {}", msg.red())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }

    if summary.records > 0 {
        writeln!(w)?;
        writeln!(
            w,
            "  {:<28} {:>7} {:>7} {:>7} {:>8} {:>7}",
            "Criterion", "Missing", "Unclear", "Clear", "Unparsed", "Errors"
        )?;
        for s in &summary.scores {
            let c = &s.counts;
            writeln!(
                w,
                "  {:<28} {:>7} {:>7} {:>7} {:>8} {:>7}",
                s.criterion, c.missing, c.unclear, c.clear, c.unparsed, c.model_errors
            )?;
        }
    }

    writeln!(w)?;
    writeln!(w, "  Results: {}", output.display())?;
    writeln!(w)?;
    Ok(())
}

/// Print the criteria catalog.
pub fn print_criteria(
    w: &mut dyn Write,
    criteria: &[Criterion],
    color: ColorMode,
) -> std::io::Result<()> {
    for c in criteria {
        if color.enabled() {
            writeln!(w, "{}", c.name.bold())?;
        } else {
            writeln!(w, "{}", c.name)?;
        }
        writeln!(w, "  {}", c.task)?;
        for (ordinal, option) in c.enumerated_options() {
            writeln!(w, "    {}: {}", ordinal, option)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
