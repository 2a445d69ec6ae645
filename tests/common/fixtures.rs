//! Response bodies served by the mock portal

/// Smallest body the fetcher accepts as a document
pub const MINIMAL_PDF: &[u8] = b"%PDF-";

/// A tiny but structurally complete PDF
pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [] /Count 0 >> endobj
trailer << /Root 1 0 R >>
%%EOF
";

/// What the portal serves, with status 200, once the session has expired
pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Hilan - Login</title></head>
  <body><form action="/login.aspx" method="post"></form></body>
</html>"#;

/// What the portal serves, with status 200, for a month without a payslip
pub const ERROR_PAGE: &str = "<html><body>Error: document not found</body></html>";
