//! # getlush
//!
//! Fetch payslips and annual tax forms (form 106) from a Hilan payroll portal.
//!
//! The portal has no API. Documents live behind predictable URLs, and an
//! authenticated browser session cookie is enough to retrieve them. getlush replays
//! that cookie for every month (payslips) or year (form 106) in a range and keeps
//! each response that is really a PDF.
//!
//! ## Design
//!
//! - **One item at a time** - a single request in flight, no retries
//! - **Failures stay local** - a missing month never stops the batch
//! - **Content over status** - the portal answers 200 for its login page, so a
//!   response is a document only if it starts with the PDF signature
//! - **Opaque cookie** - the cookie string is sent as-is and never parsed
//!
//! ## Quick Start
//!
//! ```no_run
//! use getlush::{BatchRunner, Config, Period, PeriodRange, SessionCookie};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.portal.employee_id = "123".to_string();
//!     config.payslips = Some(PeriodRange::months(
//!         Period::parse_month("2020-01")?,
//!         Period::parse_month("2021-01")?,
//!     ));
//!     config.cookie = SessionCookie::load(std::path::Path::new("hilan.cookie")).await?;
//!     tokio::fs::create_dir_all(&config.output_dir).await?;
//!
//!     let runner = BatchRunner::new(config)?;
//!     let mut events = runner.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = runner.run().await;
//!     println!("{} saved, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch orchestration
pub mod batch;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Document fetching and validation
pub mod fetcher;
/// Calendar periods and ranges
pub mod period;
/// Request construction
pub mod request;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use batch::BatchRunner;
pub use config::{Config, PortalConfig, SessionCookie};
pub use error::{Error, FetchError, PeriodError, RequestError, Result};
pub use fetcher::{FetchResult, HttpTransport, PDF_SIGNATURE, Transport, fetch_document};
pub use period::{Granularity, Period, PeriodIter, PeriodRange};
pub use request::{RequestSpec, build_request};
pub use types::{BatchReport, DocumentKind, Event, FailureStage, ItemOutcome, ItemStatus};
