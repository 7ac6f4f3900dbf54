//! Terminal output
//!
//! Everything the operator is meant to read goes to stdout through here;
//! diagnostics go through `tracing`.

use colored::*;
use dbwheel_client::{PollObserver, ResourceKind, UpsertAction, UpsertOutcome};
use dbwheel_core::domain::dbfs::FileInfo;
use dbwheel_core::domain::job::RunOutput;

/// Prints every observed status and the run page URL
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl PollObserver for ConsoleObserver {
    fn status(&mut self, resource: ResourceKind, status: Option<&str>, attempt: u32) {
        let label = format!("[{}]", resource).cyan();
        match status {
            Some(status) => println!("{} {} {}", label, status.bold(), format!("(#{})", attempt).dimmed()),
            None => println!("{} {}", label, "no status yet".dimmed()),
        }
    }

    fn run_url(&mut self, url: &str) {
        println!("{} {}", "Run page:".bold(), url.underline());
    }
}

pub fn step(message: &str) {
    println!("{} {}", "==>".green().bold(), message.bold());
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_files(path: &str, files: &[FileInfo]) {
    if files.is_empty() {
        println!("{}", format!("{} is empty.", path).yellow());
        return;
    }

    println!("{}", format!("{} ({} file(s)):", path, files.len()).bold());
    for file in files {
        let size = file
            .file_size
            .map(|size| format!("{} bytes", size))
            .unwrap_or_default();
        println!("  {} {}", file.path, size.dimmed());
    }
}

pub fn print_run_output(output: &RunOutput) {
    let sections = output.sections();
    if sections.is_empty() {
        println!("{}", "The run produced no output.".yellow());
        return;
    }

    for (label, text) in sections {
        let header = format!("===== {} =====", label);
        if label == "LOGS" {
            println!("{}", header.bold());
        } else {
            println!("{}", header.red().bold());
        }
        println!("{}", text);
    }

    if output.logs_truncated {
        println!("{}", "(logs truncated)".yellow());
    }
}

pub fn print_upsert(outcome: &UpsertOutcome) {
    let verb = match outcome.action {
        UpsertAction::Created => "Created",
        UpsertAction::Reset => "Reset",
    };
    success(&format!("{} job {}", verb, outcome.job_id));
}
