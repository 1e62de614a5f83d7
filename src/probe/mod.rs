//! Raw HTTP probe engine
//!
//! This module sends an opaque, caller-supplied byte sequence to a single
//! address and port and turns whatever comes back into a [`ProbeResult`].
//!
//! # Architecture
//!
//! One probe is one connection lifecycle, run synchronously:
//!
//! 1. `connector` opens the TCP connection (literal IPs are used as given)
//! 2. `tls` optionally upgrades it, trusting any certificate the peer presents
//! 3. `exchange` writes the request verbatim, sleeps for the settle delay and
//!    drains whatever bytes are available
//! 4. `parser` splits the raw response into status code, headers and body
//! 5. `engine` folds the outcome (or the first error) into a `ProbeResult`
//!
//! Plain and TLS connections both implement [`SessionOps`], so the exchange
//! code never knows which transport it is driving.
//!
//! # Examples
//!
//! ```no_run
//! use rawprobe::probe::{probe, RequestSpec, TlsVersion};
//!
//! let spec = RequestSpec::builder("192.0.2.10", 443, b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec())
//!     .use_tls(true)
//!     .tls_version(TlsVersion::Tls13)
//!     .include_certificate(true)
//!     .full_response(true)
//!     .build();
//!
//! let result = probe(&spec);
//! println!("{}", result.status_code());
//! ```

pub mod config;
pub mod connector;
pub mod engine;
pub mod exchange;
pub mod headers;
pub mod parser;
pub mod result;
pub mod session;
pub mod settings;
pub mod tls;

pub use config::ProbeConfig;
pub use engine::{probe, Prober};
pub use headers::Headers;
pub use parser::{ParsedResponse, StatusLineError};
pub use result::{ProbeResult, ResponseSection};
pub use session::{FdSessionOps, PollEvents, SessionOps};
pub use settings::{RequestSpec, RequestSpecBuilder};
pub use tls::{AcceptAnyCertificate, CertificateInfo, TlsError, TlsVersion, TrustPolicy};

/// Result type for probe pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised inside the probe pipeline
///
/// None of these ever reach a caller of [`probe`]; the engine renders them
/// into the `exception` field of the result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection to {target} failed: {source}")]
    Connection {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),

    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Read failed: {0}")]
    Read(#[source] std::io::Error),
}

/// Alias used where the name `Error` would be ambiguous
pub type ProbeError = Error;

/// Status code of a result whose response was never parsed
pub const STATUS_UNSET: u16 = 0;

/// Status code of a result whose pipeline failed
pub const STATUS_FAILED: u16 = 999;

/// Default settle delay between sending and reading, in milliseconds
pub const DEFAULT_WAIT_MS: u64 = 200;

/// Size of a single read while draining the response
pub const READ_CHUNK_SIZE: usize = 8192;

/// Pipeline stage, used for logging and failure attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Initialized,
    Connecting,
    TlsHandshaking,
    Transmitting,
    Collecting,
    Parsing,
    Completed,
    Failed,
}

impl ProbeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStage::Initialized => "initialized",
            ProbeStage::Connecting => "connecting",
            ProbeStage::TlsHandshaking => "tls-handshaking",
            ProbeStage::Transmitting => "transmitting",
            ProbeStage::Collecting => "collecting",
            ProbeStage::Parsing => "parsing",
            ProbeStage::Completed => "completed",
            ProbeStage::Failed => "failed",
        }
    }

    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProbeStage::Completed | ProbeStage::Failed)
    }
}

impl std::fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
