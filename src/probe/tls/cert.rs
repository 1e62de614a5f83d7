//! Peer certificate description
//!
//! Turns the X.509 certificate presented during the handshake into a plain,
//! serializable record for the probe result.

use super::config::TlsError;
use chrono::{DateTime, Utc};
use openssl::asn1::{Asn1StringRef, Asn1Time, Asn1TimeRef};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509Ref};
use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Certificate information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    /// Subject distinguished name, most specific component first
    pub subject: String,
    /// Issuer distinguished name, most specific component first
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// Serial number as upper-case hex
    pub serial_number: String,
    /// SHA-1 fingerprint of the DER encoding, upper-case hex
    pub thumbprint: String,
    /// Subject Alternative Names (`DNS:` and `IP:` entries)
    pub subject_alt_names: Vec<String>,
}

impl CertificateInfo {
    /// Extract certificate information from an X.509 certificate
    pub fn from_x509(cert: &X509Ref) -> Result<Self, TlsError> {
        let serial_number = cert.serial_number().to_bn()?.to_hex_str()?.to_uppercase();
        let thumbprint = cert
            .digest(MessageDigest::sha1())?
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();

        Ok(CertificateInfo {
            subject: distinguished_name(cert.subject_name()),
            issuer: distinguished_name(cert.issuer_name()),
            not_before: asn1_to_utc(cert.not_before())?,
            not_after: asn1_to_utc(cert.not_after())?,
            serial_number,
            thumbprint,
            subject_alt_names: subject_alt_names(cert),
        })
    }

    /// Common Name from the subject, if present
    pub fn common_name(&self) -> Option<&str> {
        self.subject
            .split(", ")
            .find_map(|part| part.strip_prefix("CN="))
    }

    /// Whether `at` falls inside the validity period
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

fn distinguished_name(name: &X509NameRef) -> String {
    let mut parts: Vec<String> = name
        .entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            format!("{}={}", key, asn1_text(entry.data()))
        })
        .collect();
    parts.reverse();
    parts.join(", ")
}

fn asn1_to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>, TlsError> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let secs = i64::from(diff.days) * 86_400 + i64::from(diff.secs);
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TlsError::Certificate(format!("time out of range: {}", time)))
}

fn subject_alt_names(cert: &X509Ref) -> Vec<String> {
    let mut names = Vec::new();

    if let Some(san_ext) = cert.subject_alt_names() {
        for name in san_ext.iter() {
            if let Some(dns) = name.dnsname() {
                names.push(format!("DNS:{}", dns));
            } else if let Some(ip) = name.ipaddress() {
                if let Ok(octets) = <[u8; 4]>::try_from(ip) {
                    names.push(format!("IP:{}", Ipv4Addr::from(octets)));
                } else if let Ok(octets) = <[u8; 16]>::try_from(ip) {
                    names.push(format!("IP:{}", Ipv6Addr::from(octets)));
                }
            }
        }
    }

    names
}

/// Common Name of a certificate subject, used in logs
pub(crate) fn subject_cn(cert: &X509Ref) -> Option<String> {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .map(|entry| asn1_text(entry.data()))
}

/// String contents as UTF-8, kept whole even past an embedded NUL
fn asn1_text(data: &Asn1StringRef) -> String {
    data.to_string()
        .unwrap_or_else(|_| String::from_utf8_lossy(data.as_slice()).into_owned())
}
