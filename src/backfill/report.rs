// Drives the rows through the vote caster and prints the progress and the summary.

use std::io::{self, Write};
use std::time::Duration;

use log::{debug, warn};

use topic_voting::{Outcome, Tally, TallyClass, VoteCaster};

use crate::backfill::config_reader::RunConfig;
use crate::backfill::io_csv::VoteRow;

const RULE_WIDTH: usize = 60;

pub enum Mode<'a> {
    /// Nothing is sent. Every row counts as a vote that would be cast.
    DryRun,
    /// One request per row, with a pause between two requests.
    Live {
        caster: &'a dyn VoteCaster,
        delay: Duration,
    },
}

/// A row that ended in an error.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Failure {
    pub topic_id: String,
    pub username: String,
    pub message: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BatchReport {
    pub tally: Tally,
    pub failures: Vec<Failure>,
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn print_banner(config: &RunConfig, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "\n{}", rule())?;
    writeln!(out, "Backfill Self-Votes via API")?;
    writeln!(out, "{}", rule())?;
    let mode = if config.dry_run {
        "DRY RUN (no changes)"
    } else {
        "LIVE (votes will be cast)"
    };
    writeln!(out, "Mode: {}", mode)?;
    writeln!(out, "Target: {}", config.api.base_url)?;
    writeln!(out, "Admin: {}", config.api.api_username)?;
    writeln!(out, "CSV File: {}", config.input.display())?;
    writeln!(out, "{}\n", rule())?;
    Ok(())
}

/// Processes all the rows in order.
///
/// Row failures never stop the batch. `pause` is called between two rows in
/// live mode, never after the last one.
pub fn run_batch(
    rows: &[VoteRow],
    mode: Mode,
    pause: &mut dyn FnMut(Duration),
    out: &mut dyn Write,
) -> io::Result<BatchReport> {
    let num_rows = rows.len();
    let mut report = BatchReport::default();

    for (idx, row) in rows.iter().enumerate() {
        let position = idx + 1;
        write!(
            out,
            "[{}/{}] Topic #{} by @{}",
            position, num_rows, row.topic_id, row.username
        )?;

        match &mode {
            Mode::DryRun => {
                writeln!(out, " -> would vote")?;
                report.tally.record_would_vote();
            }
            Mode::Live { caster, delay } => {
                let outcome = match row.validate() {
                    Ok(topic_id) => caster.cast_vote(topic_id, &row.username),
                    Err(msg) => Outcome::InvalidRow(msg),
                };
                debug!("run_batch: row {}: {:?}", position, outcome);

                match report.tally.record(&outcome) {
                    TallyClass::Succeeded => writeln!(out, " -> voted!")?,
                    TallyClass::Skipped => writeln!(out, " -> already voted (skipped)")?,
                    TallyClass::Errored => {
                        warn!(
                            "run_batch: topic {} (@{}): {}",
                            row.topic_id, row.username, outcome
                        );
                        writeln!(out, " -> ERROR: {}", outcome)?;
                        report.failures.push(Failure {
                            topic_id: row.topic_id.clone(),
                            username: row.username.clone(),
                            message: outcome.to_string(),
                        });
                    }
                }
                out.flush()?;

                if position < num_rows {
                    pause(*delay);
                }
            }
        }
    }
    Ok(report)
}

pub fn print_summary(report: &BatchReport, dry_run: bool, out: &mut dyn Write) -> io::Result<()> {
    let tally = &report.tally;
    writeln!(out, "\n{}", rule())?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "Total topics: {}", tally.total)?;
    let verb = if dry_run { "to cast" } else { "cast" };
    writeln!(out, "Votes {}: {}", verb, tally.succeeded)?;
    writeln!(out, "Already voted (skipped): {}", tally.skipped)?;
    writeln!(out, "Errors: {}", tally.errored)?;

    if !report.failures.is_empty() {
        writeln!(out, "\nErrors encountered:")?;
        for f in report.failures.iter() {
            writeln!(
                out,
                "  - Topic #{} (@{}): {}",
                f.topic_id, f.username, f.message
            )?;
        }
    }

    if dry_run {
        writeln!(out, "\n** DRY RUN COMPLETE **")?;
        writeln!(out, "To cast votes, run again with --live.")?;
    }
    writeln!(out)?;
    Ok(())
}
