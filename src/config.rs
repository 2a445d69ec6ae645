//! Configuration types for getlush

use crate::error::{Error, Result};
use crate::period::{Granularity, Period, PeriodRange};
use crate::types::DocumentKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default portal deployment
pub const DEFAULT_BASE_URL: &str = "https://traiana.net.hilan.co.il/";

/// Default parent organization id
pub const DEFAULT_ORG_ID: &str = "9133";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "getlush_out/";

/// Default cookie file
pub const DEFAULT_COOKIE_PATH: &str = "hilan.cookie";

/// Prefix some browsers include when copying a request header
pub const COOKIE_HEADER_PREFIX: &str = "Cookie: ";

/// Portal location and the identity documents are requested for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal base URL (default: the Traiana deployment)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Parent organization id (default: "9133")
    #[serde(default = "default_org_id")]
    pub org_id: String,

    /// Employee id (required)
    #[serde(default)]
    pub employee_id: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            org_id: default_org_id(),
            employee_id: String::new(),
        }
    }
}

impl PortalConfig {
    /// The portal's user identifier: organization id followed by employee id
    pub fn user_id(&self) -> String {
        format!("{}{}", self.org_id, self.employee_id)
    }
}

/// Raw session cookie, replayed verbatim as the `Cookie` header
///
/// The value is opaque: it is never split into name/value pairs. `Debug` output is
/// redacted so the cookie does not leak into logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCookie(String);

impl SessionCookie {
    /// Wrap a cookie string as-is
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Normalize the contents of a cookie file
    ///
    /// Strips a leading `Cookie: ` (as copied from browser dev tools) and trailing
    /// line terminators. Nothing else is touched.
    pub fn from_file_contents(contents: &str) -> Self {
        let value = contents
            .strip_prefix(COOKIE_HEADER_PREFIX)
            .unwrap_or(contents);
        Self(value.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read and normalize a cookie file
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(Self::from_file_contents(&contents))
    }

    /// The header value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the cookie is empty
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCookie(<{} bytes redacted>)", self.0.len())
    }
}

/// Main configuration for a batch run
///
/// Built once by the front-end and never mutated while a batch runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Portal location and identity
    #[serde(flatten)]
    pub portal: PortalConfig,

    /// Monthly payslip range `[from, to)`, `None` to skip payslips
    #[serde(default)]
    pub payslips: Option<PeriodRange>,

    /// Yearly form 106 range `[from, to)`, `None` to skip annual forms
    #[serde(default)]
    pub annual_forms: Option<PeriodRange>,

    /// Single request timeout (default: 10 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Directory fetched documents are written to (default: "getlush_out/")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Session cookie; never serialized
    #[serde(skip)]
    pub cookie: SessionCookie,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal: PortalConfig::default(),
            payslips: None,
            annual_forms: None,
            timeout: default_timeout(),
            output_dir: default_output_dir(),
            cookie: SessionCookie::default(),
        }
    }
}

impl Config {
    /// Load a JSON configuration file
    ///
    /// The cookie is not part of the file and stays empty.
    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Check the configuration before any network activity
    ///
    /// Every problem is reported, one per line.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.portal.employee_id.trim().is_empty() {
            problems.push("employee id cannot be empty".to_string());
        }
        if self.portal.base_url.trim().is_empty() {
            problems.push("base url cannot be empty".to_string());
        }
        if self.payslips.is_none() && self.annual_forms.is_none() {
            problems.push("a date range must be specified using 'from' and 'to'".to_string());
        }
        if let Some(range) = &self.payslips
            && range.granularity != Granularity::Month
        {
            problems.push("the payslip range must be stepped by month".to_string());
        }
        if let Some(range) = &self.annual_forms
            && range.granularity != Granularity::Year
        {
            problems.push("the annual form range must be stepped by year".to_string());
        }
        if self.timeout.is_zero() {
            problems.push("timeout must be greater than zero".to_string());
        }
        if self.cookie.is_empty() {
            problems.push("session cookie is empty".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Config {
                message: problems.join("\n"),
                key: None,
            })
        }
    }

    /// Every (kind, period) to fetch: payslips first, then annual forms
    pub fn work_items(&self) -> impl Iterator<Item = (DocumentKind, Period)> + '_ {
        let payslips = self
            .payslips
            .iter()
            .flat_map(|range| range.iter().map(|p| (DocumentKind::Payslip, p)));
        let forms = self
            .annual_forms
            .iter()
            .flat_map(|range| range.iter().map(|p| (DocumentKind::AnnualForm106, p)));
        payslips.chain(forms)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_org_id() -> String {
    DEFAULT_ORG_ID.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

// Duration serialization helper
/// Whole-second timeouts are stored as integer seconds, anything finer as a
/// `parse_duration` string such as "500ms". Both forms are accepted on input.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else if duration.subsec_nanos() % 1_000_000 == 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_secs_f64() * 1000.0))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Repr::Text(text) => crate::utils::parse_duration(&text).map_err(de::Error::custom),
        }
    }
}
