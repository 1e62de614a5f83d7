//! Raw response parsing
//!
//! The collected bytes are decoded (lossily) as UTF-8 and split into lines.
//! The first line is the status line, lines up to the first empty line are
//! headers, everything after it is body.

use super::headers::Headers;

const STATUS_MIN: u16 = 100;
const STATUS_MAX: u16 = 599;

/// Why a status line did not yield a status code
///
/// Not fatal: a probe whose status line does not parse completes with
/// status code 0 and no exception.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusLineError {
    #[error("Not an HTTP status line: {0:?}")]
    NotHttp(String),

    #[error("Invalid status code in status line: {0:?}")]
    InvalidCode(String),
}

/// Parsed view of a raw response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Status code from the status line; `None` when absent or unparsable
    pub status_code: Option<u16>,
    /// Set when a status line was present but did not match
    pub ambiguity: Option<StatusLineError>,
    pub headers: Headers,
    /// Body lines with empty lines removed; empty unless requested
    pub body: String,
}

impl ParsedResponse {
    /// Whether the raw response contained anything at all
    pub fn is_empty(&self) -> bool {
        self.status_code.is_none() && self.ambiguity.is_none() && self.headers.is_empty()
    }
}

/// Parse HTTP response status line
///
/// Format: `<protocol> <code> [<reason>]`, where the protocol starts with
/// `HTTP/` and the code is three digits in the range 100-599.
/// Example: `HTTP/1.1 200 OK`
pub fn parse_status_line(line: &str) -> Result<u16, StatusLineError> {
    let mut parts = line.split_whitespace();

    let protocol = parts.next().unwrap_or_default();
    if !protocol.starts_with("HTTP/") {
        return Err(StatusLineError::NotHttp(line.to_string()));
    }

    let code = parts.next().unwrap_or_default();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StatusLineError::InvalidCode(line.to_string()));
    }

    match code.parse::<u16>() {
        Ok(status) if (STATUS_MIN..=STATUS_MAX).contains(&status) => Ok(status),
        _ => Err(StatusLineError::InvalidCode(line.to_string())),
    }
}

/// Split a raw response into status code, headers and body
///
/// With `full_response` false the body is always empty. With it true, the
/// body is every non-empty line after the header block, joined with `\n`.
pub fn parse_response(raw: &[u8], full_response: bool) -> ParsedResponse {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.lines();

    let mut parsed = ParsedResponse::default();

    let status_line = match lines.next() {
        Some(line) => line,
        None => return parsed,
    };

    match parse_status_line(status_line) {
        Ok(code) => parsed.status_code = Some(code),
        Err(e) => parsed.ambiguity = Some(e),
    }

    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = Headers::parse_header_line(line) {
            parsed.headers.insert(name, value);
        }
    }

    if full_response {
        parsed.body = lines
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
    }

    parsed
}
