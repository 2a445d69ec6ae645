//! Batch orchestration: one pass over every configured (kind, period) work item
//!
//! Items are processed strictly one after another. Each item is built, fetched and
//! written before the next begins, and a failing item is reported and skipped; it
//! never stops the batch.

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{HttpTransport, Transport, fetch_document};
use crate::period::Period;
use crate::request::build_request;
use crate::types::{BatchReport, DocumentKind, Event, FailureStage, ItemOutcome, ItemStatus};
use crate::utils::write_document;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Buffered events per subscriber before it starts lagging
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives a batch run over a [`Transport`]
///
/// # Examples
///
/// ```no_run
/// use getlush::{BatchRunner, Config, Period, PeriodRange, SessionCookie};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut config = Config::default();
///     config.portal.employee_id = "123".to_string();
///     config.payslips = Some(PeriodRange::months(
///         Period::parse_month("2020-01")?,
///         Period::parse_month("2020-04")?,
///     ));
///     config.cookie = SessionCookie::new("ASP.NET_SessionId=...");
///
///     let runner = BatchRunner::new(config)?;
///     let report = runner.run().await;
///     for outcome in &report.outcomes {
///         println!("{outcome}");
///     }
///     Ok(())
/// }
/// ```
pub struct BatchRunner<T = HttpTransport> {
    config: Config,
    transport: T,
    event_tx: broadcast::Sender<Event>,
}

impl BatchRunner<HttpTransport> {
    /// Create a runner over HTTP
    ///
    /// # Errors
    /// Returns a configuration error if `config` is invalid, or an error if the HTTP
    /// client cannot be created
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new()?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> BatchRunner<T> {
    /// Create a runner over a custom transport
    ///
    /// # Errors
    /// Returns a configuration error if `config` is invalid
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            transport,
            event_tx,
        })
    }

    /// The configuration this runner was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to progress events
    ///
    /// Subscribers only see events sent after they subscribe. A subscriber more than
    /// the channel capacity behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Process every work item and report each outcome
    pub async fn run(&self) -> BatchReport {
        info!(
            transport = self.transport.name(),
            output_dir = %self.config.output_dir.display(),
            "starting batch"
        );

        let mut report = BatchReport::default();
        for (kind, period) in self.config.work_items() {
            report.outcomes.push(self.process_item(kind, period).await);
        }

        let succeeded = report.succeeded();
        let failed = report.failed();
        info!(succeeded, failed, "batch complete");

        if report.failures().any(|o| {
            matches!(
                o.status,
                ItemStatus::Failed {
                    stage: FailureStage::ContentValidation,
                    ..
                }
            )
        }) {
            warn!("some responses were not PDFs; the session cookie may have expired");
        }

        self.event_tx
            .send(Event::BatchComplete { succeeded, failed })
            .ok();
        report
    }

    /// Build, fetch and persist a single document
    pub async fn process_item(&self, kind: DocumentKind, period: Period) -> ItemOutcome {
        self.event_tx.send(Event::ItemStarted { kind, period }).ok();

        let status = match self.fetch_and_store(kind, period).await {
            Ok((path, bytes)) => {
                info!(%kind, %period, path = %path.display(), bytes, "saved document");
                self.event_tx
                    .send(Event::ItemSaved {
                        kind,
                        period,
                        path: path.clone(),
                        bytes,
                    })
                    .ok();
                ItemStatus::Saved { path, bytes }
            }
            Err(e) => {
                let stage = e.stage();
                let reason = e.to_string();
                error!(%kind, %period, %stage, error = %reason, "failed to fetch document");
                self.event_tx
                    .send(Event::ItemFailed {
                        kind,
                        period,
                        stage,
                        reason: reason.clone(),
                    })
                    .ok();
                ItemStatus::Failed { stage, reason }
            }
        };

        ItemOutcome {
            kind,
            period,
            status,
        }
    }

    async fn fetch_and_store(&self, kind: DocumentKind, period: Period) -> Result<(PathBuf, u64)> {
        let spec = build_request(&self.config, kind, period)?;
        debug!(url = %spec.url, "getting");

        let body = fetch_document(&self.transport, &spec, self.config.timeout).await?;

        let filename = kind.output_filename(period);
        debug!(file = %filename, kbytes = body.len() / 1000, "writing");
        let path = write_document(&self.config.output_dir, &filename, &body).await?;
        Ok((path, body.len() as u64))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PortalConfig, SessionCookie};
    use crate::error::{Error, FetchError};
    use crate::period::PeriodRange;
    use crate::request::RequestSpec;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    const PDF: &[u8] = b"%PDF-1.7\n%%EOF\n";

    /// Serves a PDF for every URL except those containing a failing marker
    #[derive(Default)]
    struct Scripted {
        refuse: HashSet<&'static str>,
        login_page: HashSet<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(
            &self,
            spec: &RequestSpec,
            _: Duration,
        ) -> std::result::Result<Vec<u8>, FetchError> {
            let url = spec.url.to_string();
            self.seen.lock().unwrap().push(url.clone());
            if self.refuse.iter().any(|m| url.contains(m)) {
                return Err(FetchError::Connect {
                    url,
                    reason: "connection refused".into(),
                });
            }
            if self.login_page.iter().any(|m| url.contains(m)) {
                return Ok(b"<html>please log in</html>".to_vec());
            }
            Ok(PDF.to_vec())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn month(s: &str) -> Period {
        Period::parse_month(s).unwrap()
    }

    fn config(output_dir: PathBuf) -> Config {
        Config {
            portal: PortalConfig {
                base_url: "https://example.test/".into(),
                org_id: "9133".into(),
                employee_id: "123".into(),
            },
            payslips: Some(PeriodRange::months(month("2020-01"), month("2020-05"))),
            output_dir,
            cookie: SessionCookie::new("abc"),
            ..Default::default()
        }
    }

    fn exists(dir: &TempDir, name: &str) -> bool {
        dir.path().join(name).exists()
    }

    #[tokio::test]
    async fn all_items_saved_in_order() {
        let dir = TempDir::new().unwrap();
        let runner =
            BatchRunner::with_transport(config(dir.path().into()), Scripted::default()).unwrap();

        let report = runner.run().await;

        assert_eq!(report.outcomes.len(), 4);
        assert!(report.is_complete_success());
        let periods: Vec<_> = report.outcomes.iter().map(|o| o.period.to_string()).collect();
        assert_eq!(periods, vec!["2020-01", "2020-02", "2020-03", "2020-04"]);
        for p in periods {
            assert!(exists(&dir, &format!("payslip_{p}.pdf")));
        }
        let seen = runner.transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].ends_with("PaySlip2020-01.pdf?Date=01/01/2020&UserId=9133123"));
    }

    #[tokio::test]
    async fn one_failing_item_does_not_stop_the_rest() {
        let dir = TempDir::new().unwrap();
        let transport = Scripted {
            refuse: HashSet::from(["PaySlip2020-02"]),
            ..Default::default()
        };
        let runner = BatchRunner::with_transport(config(dir.path().into()), transport).unwrap();

        let report = runner.run().await;

        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.period, month("2020-02"));
        assert!(matches!(
            failure.status,
            ItemStatus::Failed {
                stage: FailureStage::Network,
                ..
            }
        ));
        assert!(!exists(&dir, "payslip_2020-02.pdf"));
        for p in ["2020-01", "2020-03", "2020-04"] {
            assert!(exists(&dir, &format!("payslip_{p}.pdf")), "{p} missing");
        }
    }

    #[tokio::test]
    async fn non_pdf_body_is_content_failure_and_not_written() {
        let dir = TempDir::new().unwrap();
        let transport = Scripted {
            login_page: HashSet::from(["PaySlip2020-03"]),
            ..Default::default()
        };
        let runner = BatchRunner::with_transport(config(dir.path().into()), transport).unwrap();

        let report = runner.run().await;

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.period, month("2020-03"));
        match &failure.status {
            ItemStatus::Failed { stage, reason } => {
                assert_eq!(*stage, FailureStage::ContentValidation);
                assert!(reason.contains("not a PDF"), "{reason}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!exists(&dir, "payslip_2020-03.pdf"));
        assert_eq!(report.succeeded(), 3);
    }

    #[tokio::test]
    async fn unwritable_output_is_reported_per_item() {
        let dir = TempDir::new().unwrap();
        let runner = BatchRunner::with_transport(
            config(dir.path().join("missing-dir")),
            Scripted::default(),
        )
        .unwrap();

        let report = runner.run().await;

        assert_eq!(report.failed(), 4);
        assert!(report.outcomes.iter().all(|o| matches!(
            o.status,
            ItemStatus::Failed {
                stage: FailureStage::Persistence,
                ..
            }
        )));
        // every item was still attempted
        assert_eq!(runner.transport.seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn bad_base_url_fails_each_item_without_any_request() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path().into());
        config.portal.base_url = "::not a url::".into();
        let runner = BatchRunner::with_transport(config, Scripted::default()).unwrap();

        let report = runner.run().await;

        assert_eq!(report.outcomes.len(), 4);
        assert!(report.outcomes.iter().all(|o| matches!(
            o.status,
            ItemStatus::Failed {
                stage: FailureStage::RequestConstruction,
                ..
            }
        )));
        assert!(runner.transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn payslips_and_forms_run_in_one_batch() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path().into());
        config.payslips = Some(PeriodRange::months(month("2020-01"), month("2020-02")));
        config.annual_forms = Some(PeriodRange::years(
            Period::year(2020).unwrap(),
            Period::year(2022).unwrap(),
        ));
        let runner = BatchRunner::with_transport(config, Scripted::default()).unwrap();

        let report = runner.run().await;

        assert!(report.is_complete_success());
        assert!(exists(&dir, "payslip_2020-01.pdf"));
        assert!(exists(&dir, "form106_2020.pdf"));
        assert!(exists(&dir, "form106_2021.pdf"));
        let seen = runner.transport.seen.lock().unwrap();
        assert!(seen[1].ends_with("Pdf106.aspx/Pdf106-2020.pdf?Year=2020&UserId=9133123"));
    }

    #[tokio::test]
    async fn empty_range_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path().into());
        config.payslips = Some(PeriodRange::months(month("2020-04"), month("2020-01")));
        let runner = BatchRunner::with_transport(config, Scripted::default()).unwrap();

        let report = runner.run().await;

        assert!(report.outcomes.is_empty());
        assert!(report.is_complete_success());
    }

    #[tokio::test]
    async fn events_follow_item_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path().into());
        config.payslips = Some(PeriodRange::months(month("2020-01"), month("2020-03")));
        let transport = Scripted {
            refuse: HashSet::from(["PaySlip2020-02"]),
            ..Default::default()
        };
        let runner = BatchRunner::with_transport(config, transport).unwrap();
        let mut events = runner.subscribe();

        runner.run().await;

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(received.len(), 5);
        assert!(matches!(received[0], Event::ItemStarted { .. }));
        assert!(matches!(received[1], Event::ItemSaved { bytes, .. } if bytes == PDF.len() as u64));
        assert!(matches!(received[2], Event::ItemStarted { .. }));
        assert!(matches!(
            received[3],
            Event::ItemFailed {
                stage: FailureStage::Network,
                ..
            }
        ));
        assert_eq!(
            received[4],
            Event::BatchComplete {
                succeeded: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("payslip_2020-01.pdf"), b"stale")
            .await
            .unwrap();
        let mut config = config(dir.path().into());
        config.payslips = Some(PeriodRange::months(month("2020-01"), month("2020-02")));
        let runner = BatchRunner::with_transport(config, Scripted::default()).unwrap();

        runner.run().await;

        let contents = tokio::fs::read(dir.path().join("payslip_2020-01.pdf"))
            .await
            .unwrap();
        assert_eq!(contents, PDF);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_request() {
        let result = BatchRunner::with_transport(Config::default(), Scripted::default());
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn runner_exposes_its_config() {
        let dir = TempDir::new().unwrap();
        let runner =
            BatchRunner::with_transport(config(dir.path().into()), Scripted::default()).unwrap();
        assert_eq!(runner.config().output_dir, dir.path());
        assert_eq!(runner.config().work_items().count(), 4);
    }
}
