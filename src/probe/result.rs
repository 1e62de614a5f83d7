//! Probe result record
//!
//! One [`ProbeResult`] per invocation. Serialized field names (`settings`,
//! `timestamp`, `request`, `response`, `statusCode`, `exception`) are what
//! downstream tooling reads and must not change.

use super::headers::Headers;
use super::parser::ParsedResponse;
use super::settings::RequestSpec;
use super::tls::CertificateInfo;
use super::{STATUS_FAILED, STATUS_UNSET};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::error::Error as StdError;

/// Response part of a result; everything defaults to empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<CertificateInfo>,
    body: String,
    headers: Headers,
}

impl ResponseSection {
    pub fn certificate(&self) -> Option<&CertificateInfo> {
        self.certificate.as_ref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    settings: RequestSpec,
    timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_lossy")]
    request: Vec<u8>,
    response: ResponseSection,
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<String>,
}

impl ProbeResult {
    /// Fresh result in the initialized state (status code 0)
    pub fn started(spec: &RequestSpec, timestamp: DateTime<Utc>) -> Self {
        ProbeResult {
            settings: spec.clone(),
            timestamp,
            request: spec.request().to_vec(),
            response: ResponseSection::default(),
            status_code: STATUS_UNSET,
            exception: None,
        }
    }

    /// Fill in a parsed response; an unparsed status line leaves status 0
    pub fn complete(mut self, parsed: ParsedResponse, certificate: Option<CertificateInfo>) -> Self {
        self.status_code = parsed.status_code.unwrap_or(STATUS_UNSET);
        self.response = ResponseSection {
            certificate,
            body: parsed.body,
            headers: parsed.headers,
        };
        self.exception = None;
        self
    }

    /// Record a pipeline failure (status code 999)
    pub fn failed(mut self, error: &(dyn StdError + 'static)) -> Self {
        self.status_code = STATUS_FAILED;
        self.response = ResponseSection::default();
        self.exception = Some(describe_error(error));
        self
    }

    /// Echo of the request settings this probe ran with
    pub fn settings(&self) -> &RequestSpec {
        &self.settings
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The exact bytes that were sent
    pub fn request(&self) -> &[u8] {
        &self.request
    }

    pub fn response(&self) -> &ResponseSection {
        &self.response
    }

    /// 0 = not parsed, 999 = failed, anything else = HTTP status
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.status_code == STATUS_FAILED
    }

    /// Serialize to JSON
    ///
    /// `request` is rendered as text: bytes that are not valid UTF-8 become
    /// U+FFFD, so the JSON copy is not byte-exact. Use [`request`](Self::request)
    /// when the exact bytes matter.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Pretty-printed [`to_json`](Self::to_json)
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Error message followed by any causes it does not already mention
fn describe_error(error: &(dyn StdError + 'static)) -> String {
    let mut description = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }

    description
}

fn serialize_lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}
