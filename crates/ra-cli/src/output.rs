//! Output formatting utilities.

use colored::Colorize;
use ra_model::OutcomeRecord;
use ra_reconcile::CycleReport;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// One outcome as a table row.
#[derive(Debug, Tabled)]
pub struct OutcomeRow {
    /// Pairing name.
    #[tabled(rename = "Pairing")]
    pub pairing: String,
    /// Registry service ID.
    #[tabled(rename = "Service")]
    pub service: String,
    /// HTTP status.
    #[tabled(rename = "Status")]
    pub status: u16,
    /// Deployment state.
    #[tabled(rename = "State")]
    pub state: String,
    /// Backend identifier.
    #[tabled(rename = "External ID")]
    pub external_id: String,
    /// Client or entity identifier, or the failure description.
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl OutcomeRow {
    /// Builds a row.
    #[must_use]
    pub fn new(pairing: &str, outcome: &OutcomeRecord) -> Self {
        let detail = if outcome.is_deployed() {
            outcome.client_id.clone()
        } else {
            outcome.error_description.clone()
        };
        Self {
            pairing: pairing.to_string(),
            service: outcome.id.to_string(),
            status: outcome.status_code,
            state: if outcome.is_deployed() {
                "deployed".to_string()
            } else {
                "error".to_string()
            },
            external_id: outcome.external_id.clone().unwrap_or_default(),
            detail: detail.unwrap_or_default(),
        }
    }
}

/// Prints the outcomes of a round of cycles.
pub fn reports(reports: &[CycleReport], format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<OutcomeRow> = reports
                .iter()
                .flat_map(|r| r.outcomes.iter().map(|o| OutcomeRow::new(&r.pairing, o)))
                .collect();
            if rows.is_empty() {
                info("No pending messages.");
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()).to_string());
            }
            for report in reports {
                if report.has_failures() {
                    warning(&report.summary());
                } else {
                    success(&report.summary());
                }
            }
        }
        OutputFormat::Json => single(&reports, format)?,
        OutputFormat::Quiet => {}
    }
    Ok(())
}

/// Outputs a single serializable item.
pub fn single<T: Serialize + ?Sized>(item: &T, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}
