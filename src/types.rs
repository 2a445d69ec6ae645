//! Core types and events for getlush

use crate::period::{Granularity, Period};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of document served by the portal
///
/// Each kind carries its own remote path, query shape, output filename and period
/// granularity. Adding a document type means adding a variant here; the batch loop
/// does not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Monthly payslip
    #[serde(rename = "payslip")]
    Payslip,
    /// Annual tax form 106
    #[serde(rename = "form106")]
    AnnualForm106,
}

impl DocumentKind {
    /// Every supported kind, in batch order
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Payslip, DocumentKind::AnnualForm106];

    /// Short name used in filenames and logs
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Payslip => "payslip",
            DocumentKind::AnnualForm106 => "form106",
        }
    }

    /// Period granularity the portal serves this kind at
    pub fn granularity(self) -> Granularity {
        match self {
            DocumentKind::Payslip => Granularity::Month,
            DocumentKind::AnnualForm106 => Granularity::Year,
        }
    }

    /// Path below the portal base URL, ending with a separator
    pub fn path_segment(self) -> &'static str {
        match self {
            DocumentKind::Payslip => "Hilannetv2/PersonalFile/PdfPaySlip.aspx/",
            DocumentKind::AnnualForm106 => "Hilannetv2/PersonalFile/Pdf106.aspx/",
        }
    }

    /// Remote file name plus query string for one period
    ///
    /// `user_id` is the organization id immediately followed by the employee id.
    pub fn remote_file(self, period: Period, user_id: &str) -> String {
        let period = period.truncate(self.granularity());
        match self {
            // PaySlip2020-01.pdf?Date=01/01/2020&UserId=9133123
            DocumentKind::Payslip => format!(
                "PaySlip{}.pdf?Date={}&UserId={}",
                period.format_month(),
                period.format_day_month_year(),
                user_id
            ),
            // Pdf106-2020.pdf?Year=2020&UserId=9133123
            DocumentKind::AnnualForm106 => {
                let year = period.format_year();
                format!("Pdf106-{year}.pdf?Year={year}&UserId={user_id}")
            }
        }
    }

    /// Local file name a fetched document is saved under
    pub fn output_filename(self, period: Period) -> String {
        let period = period.truncate(self.granularity());
        match self {
            DocumentKind::Payslip => format!("payslip_{}.pdf", period.format_month()),
            DocumentKind::AnnualForm106 => format!("form106_{}.pdf", period.format_year()),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stage at which a work item failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Invalid configuration (fatal, before any request)
    Configuration,
    /// The request could not be built
    RequestConstruction,
    /// Connection failure, timeout or truncated transfer
    Network,
    /// The body was not a document; usually an expired session
    ContentValidation,
    /// The document could not be written
    Persistence,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Configuration => "configuration",
            FailureStage::RequestConstruction => "request construction",
            FailureStage::Network => "network",
            FailureStage::ContentValidation => "content validation",
            FailureStage::Persistence => "persistence",
        };
        f.write_str(s)
    }
}

/// Result of processing one (kind, period) work item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// Document fetched and written
    Saved {
        /// Written file
        path: PathBuf,
        /// Document size in bytes
        bytes: u64,
    },
    /// Item skipped
    Failed {
        /// Where it failed
        stage: FailureStage,
        /// Human-readable reason
        reason: String,
    },
}

/// Outcome of one work item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Document kind
    pub kind: DocumentKind,
    /// Period the document covers
    pub period: Period,
    /// What happened
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    /// Whether the document was saved
    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Saved { .. })
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            ItemStatus::Saved { path, bytes } => write!(
                f,
                "{} {}: saved {} [~{}K]",
                self.kind,
                self.period,
                path.display(),
                bytes / 1000
            ),
            ItemStatus::Failed { stage, reason } => {
                write!(f, "{} {}: failed ({stage}): {reason}", self.kind, self.period)
            }
        }
    }
}

/// Outcomes of a whole batch, in processing order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One entry per work item
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Number of saved documents
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed items
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when every item was saved (including an empty batch)
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }

    /// Failed items only
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Event emitted while a batch runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A work item is about to be requested
    ItemStarted {
        /// Document kind
        kind: DocumentKind,
        /// Period
        period: Period,
    },

    /// A document was written
    ItemSaved {
        /// Document kind
        kind: DocumentKind,
        /// Period
        period: Period,
        /// Written file
        path: PathBuf,
        /// Size in bytes
        bytes: u64,
    },

    /// A work item was skipped
    ItemFailed {
        /// Document kind
        kind: DocumentKind,
        /// Period
        period: Period,
        /// Where it failed
        stage: FailureStage,
        /// Human-readable reason
        reason: String,
    },

    /// Every work item has been processed
    BatchComplete {
        /// Saved documents
        succeeded: usize,
        /// Failed items
        failed: usize,
    },
}
