//! getlush command line front-end
//!
//! Parses flags, loads the cookie file, prepares the output directory and runs one
//! batch. Exit code 0 means every document was saved, 1 a setup error, 2 that at
//! least one document failed.

use clap::Parser;
use getlush::config::{DEFAULT_BASE_URL, DEFAULT_COOKIE_PATH, DEFAULT_ORG_ID, DEFAULT_OUTPUT_DIR};
use getlush::utils::parse_duration;
use getlush::{BatchRunner, Config, Error, Period, PeriodRange, SessionCookie};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fetch Hilan payslips and form 106 PDFs using an existing session cookie"
)]
struct Args {
    /// Hilan's base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Parent organization ID
    #[arg(long, default_value = DEFAULT_ORG_ID)]
    org: String,

    /// Employee ID [required]
    #[arg(long)]
    emp: Option<String>,

    /// First payslip to fetch (YYYY-MM) [required]
    #[arg(long, value_parser = Period::parse_month)]
    from: Option<Period>,

    /// Payslip range end, exclusive (YYYY-MM) [required]
    #[arg(long, value_parser = Period::parse_month)]
    to: Option<Period>,

    /// First form 106 year to fetch (YYYY)
    #[arg(long, value_parser = Period::parse_year, requires = "years_to")]
    years_from: Option<Period>,

    /// Form 106 range end, exclusive (YYYY)
    #[arg(long, value_parser = Period::parse_year, requires = "years_from")]
    years_to: Option<Period>,

    /// Skip payslips, only fetch form 106
    #[arg(long)]
    no_payslips: bool,

    /// Path to cookie file
    #[arg(long, default_value = DEFAULT_COOKIE_PATH)]
    cookie: PathBuf,

    /// Directory path for fetched pdfs
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    out: PathBuf,

    /// Single request timeout (e.g. 10s, 500ms, 2m)
    #[arg(short = 't', long, default_value = "10s", value_parser = parse_duration)]
    timeout: Duration,

    /// JSON config file; flags given explicitly override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every request URL and written file
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    // RUST_LOG still wins over the flag
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,getlush={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Merge the optional config file with the flags
///
/// Values from the file are kept unless the flag was given on the command line.
async fn build_config(args: &Args, matches: &clap::ArgMatches) -> Result<Config, Error> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path).await?,
        None => Config::default(),
    };

    let explicit = |id: &str| {
        args.config.is_none()
            || matches.value_source(id) == Some(clap::parser::ValueSource::CommandLine)
    };

    if explicit("url") {
        config.portal.base_url = args.url.clone();
    }
    if explicit("org") {
        config.portal.org_id = args.org.clone();
    }
    if let Some(emp) = &args.emp {
        config.portal.employee_id = emp.clone();
    }
    if let (Some(from), Some(to)) = (args.from, args.to) {
        config.payslips = Some(PeriodRange::months(from, to));
    } else if args.from.is_some() || args.to.is_some() {
        return Err(Error::config(
            "payslips",
            "a date range must be specified using both 'from' and 'to'",
        ));
    }
    if args.no_payslips {
        config.payslips = None;
    }
    if let (Some(from), Some(to)) = (args.years_from, args.years_to) {
        config.annual_forms = Some(PeriodRange::years(from, to));
    }
    if explicit("timeout") {
        config.timeout = args.timeout;
    }
    if explicit("out") {
        config.output_dir = args.out.clone();
    }

    config.cookie = SessionCookie::load(&args.cookie).await.map_err(|e| {
        Error::config(
            "cookie",
            format!("could not read cookie file {}: {e}", args.cookie.display()),
        )
    })?;

    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = <Args as clap::CommandFactory>::command().get_matches();
    let args = match <Args as clap::FromArgMatches>::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };
    init_logging(args.verbose);

    let config = match build_config(&args, &matches).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        eprintln!("run with --help for usage");
        return ExitCode::from(1);
    }
    if let Err(e) = tokio::fs::create_dir_all(&config.output_dir).await {
        eprintln!(
            "could not verify output directory {}: {e}",
            config.output_dir.display()
        );
        return ExitCode::from(1);
    }

    let runner = match BatchRunner::new(config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    let report = runner.run().await;
    for outcome in &report.outcomes {
        println!("{outcome}");
    }

    if report.is_complete_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
