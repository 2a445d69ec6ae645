//! Utility functions for persisting documents and parsing durations

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Write `bytes` to `dir/filename`, replacing any existing file
///
/// The bytes go to a hidden `.part` sibling first, which is then renamed over the
/// target, so a failed write never leaves a truncated document behind. The
/// directory must already exist.
///
/// # Errors
///
/// Returns [`Error::Persist`] naming the destination when the write fails.
pub async fn write_document(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(filename);
    let partial = dir.join(format!(".{filename}.part"));

    let written = match tokio::fs::write(&partial, bytes).await {
        Ok(()) => tokio::fs::rename(&partial, &path).await,
        Err(e) => Err(e),
    };
    match written {
        Ok(()) => Ok(path),
        Err(source) => {
            // best effort, the temp file may never have been created
            let _ = tokio::fs::remove_file(&partial).await;
            Err(Error::Persist { path, source })
        }
    }
}

/// Parse a Go-style duration such as `10s`, `500ms`, `2m` or `1h`
///
/// A bare number is read as seconds. Fractions are allowed (`1.5s`).
///
/// # Examples
///
/// ```
/// use getlush::utils::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
/// ```
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    if number.is_empty() {
        return Err(format!("invalid duration '{input}': missing number"));
    }
    if unit == "ms"
        && let Ok(millis) = number.parse::<u64>()
    {
        return Ok(Duration::from_millis(millis));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{input}': bad number '{number}'"))?;
    let secs = match unit {
        "" | "s" => value,
        "ms" => value / 1000.0,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => return Err(format!("invalid duration '{input}': unknown unit '{other}'")),
    };
    Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("invalid duration '{input}': {e}"))
}
