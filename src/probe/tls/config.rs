//! TLS client configuration
//!
//! This module provides the protocol version selector and the client
//! configuration builder used to upgrade probe connections.

use super::trust::{AcceptAnyCertificate, TrustPolicy};
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode, SslVersion};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// TLS protocol version selector
///
/// The names follow the usual short spellings: `tls` is TLS 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsVersion {
    /// SSL 2.0 (not implemented by OpenSSL, always fails)
    Ssl2,
    /// SSL 3.0
    Ssl3,
    /// TLS 1.0
    Tls,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    #[default]
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> Result<SslVersion, TlsError> {
        match self {
            TlsVersion::Ssl2 => Err(TlsError::UnsupportedVersion(self.as_str().to_string())),
            TlsVersion::Ssl3 => Ok(SslVersion::SSL3),
            TlsVersion::Tls => Ok(SslVersion::TLS1),
            TlsVersion::Tls11 => Ok(SslVersion::TLS1_1),
            TlsVersion::Tls12 => Ok(SslVersion::TLS1_2),
            TlsVersion::Tls13 => Ok(SslVersion::TLS1_3),
        }
    }

    /// Short name (`ssl3`, `tls12`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Ssl2 => "ssl2",
            TlsVersion::Ssl3 => "ssl3",
            TlsVersion::Tls => "tls",
            TlsVersion::Tls11 => "tls11",
            TlsVersion::Tls12 => "tls12",
            TlsVersion::Tls13 => "tls13",
        }
    }

    /// Versions below TLS 1.2 need OpenSSL's security level lowered
    fn is_legacy(&self) -> bool {
        *self < TlsVersion::Tls12
    }
}

impl FromStr for TlsVersion {
    type Err = TlsError;

    /// Parse TLS version from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssl2" | "sslv2" | "ssl2.0" => Ok(TlsVersion::Ssl2),
            "ssl3" | "sslv3" | "ssl3.0" => Ok(TlsVersion::Ssl3),
            "tls" | "tls1" | "tlsv1" | "tls1.0" | "tlsv1.0" | "tls10" => Ok(TlsVersion::Tls),
            "tls11" | "tls1.1" | "tlsv1.1" => Ok(TlsVersion::Tls11),
            "tls12" | "tls1.2" | "tlsv1.2" => Ok(TlsVersion::Tls12),
            "tls13" | "tls1.3" | "tlsv1.3" => Ok(TlsVersion::Tls13),
            _ => Err(TlsError::InvalidVersion(s.to_string())),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TLS version: {0}")]
    InvalidVersion(String),

    #[error("Unsupported TLS version: {0}")]
    UnsupportedVersion(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),
}

/// TLS client configuration (immutable after building)
#[derive(Clone)]
pub struct TlsConfig {
    pub(crate) ctx: SslContext,
    pub(crate) version: TlsVersion,
    pub(crate) servername: Option<String>,
    pub(crate) trust_policy: &'static str,
}

impl TlsConfig {
    /// Create a new client configuration builder
    pub fn client() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Upgrade a connected TCP stream (performs the handshake)
    pub fn connect(&self, stream: std::net::TcpStream) -> Result<super::TlsSessionOps, TlsError> {
        super::session::TlsSessionOps::connect(stream, self)
    }

    pub fn version(&self) -> TlsVersion {
        self.version
    }

    pub fn servername(&self) -> Option<&str> {
        self.servername.as_deref()
    }

    /// Name of the installed trust policy
    pub fn trust_policy(&self) -> &'static str {
        self.trust_policy
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("version", &self.version)
            .field("servername", &self.servername)
            .field("trust_policy", &self.trust_policy)
            .finish_non_exhaustive()
    }
}

/// Client configuration builder
///
/// Nothing touches OpenSSL until [`build`](Self::build), so every failure
/// surfaces there as a `TlsError`.
pub struct ClientConfigBuilder {
    version: TlsVersion,
    servername: Option<String>,
    trust_policy: Arc<dyn TrustPolicy>,
}

impl ClientConfigBuilder {
    fn new() -> Self {
        ClientConfigBuilder {
            version: TlsVersion::default(),
            servername: None,
            trust_policy: Arc::new(AcceptAnyCertificate),
        }
    }

    /// Set TLS version (both min and max)
    pub fn version(mut self, version: TlsVersion) -> Self {
        self.version = version;
        self
    }

    /// Set SNI servername
    pub fn servername(mut self, name: impl Into<String>) -> Self {
        self.servername = Some(name.into());
        self
    }

    /// Install the policy that judges the peer's certificate chain
    pub fn trust_policy(mut self, policy: Arc<dyn TrustPolicy>) -> Self {
        self.trust_policy = policy;
        self
    }

    /// Build the TLS configuration
    pub fn build(self) -> Result<TlsConfig, TlsError> {
        let protocol = self.version.to_openssl_version()?;

        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_client())?;
        ctx_builder.set_min_proto_version(Some(protocol))?;
        ctx_builder.set_max_proto_version(Some(protocol))?;

        if self.version.is_legacy() {
            // OpenSSL 3 refuses pre-1.2 handshakes at the default level
            ctx_builder.set_security_level(0);
        }

        let policy = Arc::clone(&self.trust_policy);
        ctx_builder.set_verify_callback(SslVerifyMode::PEER, move |preverified, ctx| {
            policy.verify(preverified, ctx)
        });

        Ok(TlsConfig {
            ctx: ctx_builder.build(),
            version: self.version,
            servername: self.servername,
            trust_policy: self.trust_policy.name(),
        })
    }
}
