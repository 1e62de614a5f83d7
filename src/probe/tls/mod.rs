//! TLS upgrade for probe connections
//!
//! Wraps an established TCP stream in an OpenSSL client session pinned to a
//! single protocol version.
//!
//! # Trust
//!
//! Peer certificates are judged by a [`TrustPolicy`] object installed as the
//! OpenSSL verify callback. Probes always install [`AcceptAnyCertificate`]:
//! the point is to reach hosts whose certificate would not validate (a node
//! addressed by IP, a fresh deployment, an expired chain), so the chain is
//! accepted unconditionally and only reported, never checked. The default
//! trust store is never consulted.
//!
//! # Examples
//!
//! ```no_run
//! use rawprobe::probe::tls::{AcceptAnyCertificate, TlsConfig, TlsVersion};
//! use std::net::TcpStream;
//! use std::sync::Arc;
//!
//! let config = TlsConfig::client()
//!     .version(TlsVersion::Tls12)
//!     .servername("example.com")
//!     .trust_policy(Arc::new(AcceptAnyCertificate))
//!     .build()
//!     .unwrap();
//!
//! let tcp = TcpStream::connect("192.0.2.10:443").unwrap();
//! let session = config.connect(tcp).unwrap();
//! println!("{:?}", session.peer_certificate());
//! ```

pub mod cert;
pub mod config;
pub mod session;
pub mod trust;

pub use cert::CertificateInfo;
pub use config::{ClientConfigBuilder, TlsConfig, TlsError, TlsVersion};
pub use session::TlsSessionOps;
pub use trust::{AcceptAnyCertificate, TrustPolicy};

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;
