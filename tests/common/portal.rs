//! Mock portal and configuration helpers

use getlush::{Config, Period, PeriodRange, PortalConfig, SessionCookie};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Organization id used by every test
pub const ORG_ID: &str = "9133";
/// Employee id used by every test
pub const EMPLOYEE_ID: &str = "123";
/// Session cookie used by every test
pub const COOKIE: &str = "abc";

/// Parse a `YYYY-MM` month, panicking on bad test input
pub fn month(s: &str) -> Period {
    Period::parse_month(s).unwrap_or_else(|e| panic!("bad month {s}: {e}"))
}

/// Parse a `YYYY` year, panicking on bad test input
pub fn year(s: &str) -> Period {
    Period::parse_year(s).unwrap_or_else(|e| panic!("bad year {s}: {e}"))
}

/// Config pointed at `server` writing into `output_dir`, with no ranges set
pub fn portal_config(server: &MockServer, output_dir: &Path) -> Config {
    Config {
        portal: PortalConfig {
            base_url: server.uri(),
            org_id: ORG_ID.to_string(),
            employee_id: EMPLOYEE_ID.to_string(),
        },
        timeout: Duration::from_secs(5),
        output_dir: output_dir.to_path_buf(),
        cookie: SessionCookie::new(COOKIE),
        ..Default::default()
    }
}

/// Config fetching payslips for `[from, to)`
pub fn payslip_config(server: &MockServer, output_dir: &Path, from: &str, to: &str) -> Config {
    Config {
        payslips: Some(PeriodRange::months(month(from), month(to))),
        ..portal_config(server, output_dir)
    }
}

/// Fresh output directory
pub fn output_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"))
}

/// Serve `template` for the payslip of `yyyy_mm`, checking cookie and query
pub async fn mount_payslip(server: &MockServer, yyyy_mm: &str, template: ResponseTemplate) {
    let (y, m) = yyyy_mm.split_at(4);
    let date = format!("01/{}/{}", &m[1..], y);
    Mock::given(method("GET"))
        .and(path(format!(
            "/Hilannetv2/PersonalFile/PdfPaySlip.aspx/PaySlip{yyyy_mm}.pdf"
        )))
        .and(query_param("Date", date.as_str()))
        .and(query_param("UserId", format!("{ORG_ID}{EMPLOYEE_ID}").as_str()))
        .and(header("Cookie", COOKIE))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

/// Serve `template` for the form 106 of `yyyy`, checking cookie and query
pub async fn mount_form106(server: &MockServer, yyyy: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/Hilannetv2/PersonalFile/Pdf106.aspx/Pdf106-{yyyy}.pdf"
        )))
        .and(query_param("Year", yyyy))
        .and(query_param("UserId", format!("{ORG_ID}{EMPLOYEE_ID}").as_str()))
        .and(header("Cookie", COOKIE))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

/// 200 with a PDF body
pub fn pdf_response(body: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "application/pdf")
        .set_body_bytes(body)
}

/// 200 with an HTML body, the way the portal reports every error
pub fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/html; charset=utf-8")
        .set_body_string(body)
}
