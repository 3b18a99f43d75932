use crate::error::UrlViolation;
use url::Url;

/// Longest original URL accepted, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// Validates that `raw` is an absolute http(s) URL with a host.
pub fn validate_target_url(raw: &str) -> Result<(), UrlViolation> {
    if raw.trim().is_empty() {
        return Err(UrlViolation::Empty);
    }

    if raw.len() > MAX_URL_LENGTH {
        return Err(UrlViolation::TooLong {
            len: raw.len(),
            max: MAX_URL_LENGTH,
        });
    }

    let parsed = Url::parse(raw).map_err(|e| UrlViolation::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlViolation::UnsupportedScheme(other.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlViolation::MissingHost);
    }

    Ok(())
}
