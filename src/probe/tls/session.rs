//! TLS session operations
//!
//! Implements [`SessionOps`] over an OpenSSL stream, so the exchange code
//! drives TLS exactly like plain TCP.

use super::cert::{subject_cn, CertificateInfo};
use super::config::{TlsConfig, TlsError};
use crate::probe::session::{poll_fd, shutdown_tcp, PollEvents, SessionOps};
use openssl::ssl::{Ssl, SslStream};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::fd::AsRawFd;
use std::time::Duration;

/// TLS session operations
#[derive(Debug)]
pub struct TlsSessionOps {
    stream: SslStream<TcpStream>,
    failed: bool,
}

impl TlsSessionOps {
    /// Create a client TLS connection (perform handshake)
    ///
    /// The handshake runs in blocking mode, bounded by the socket's read and
    /// write timeouts.
    pub fn connect(tcp_stream: TcpStream, config: &TlsConfig) -> Result<Self, TlsError> {
        let mut ssl = Ssl::new(&config.ctx)?;

        if let Some(ref servername) = config.servername {
            ssl.set_hostname(servername)?;
        }

        let stream = ssl
            .connect(tcp_stream)
            .map_err(|e| TlsError::HandshakeFailed(e.to_string()))?;

        tracing::debug!(
            version = stream.ssl().version_str(),
            cipher = stream.ssl().current_cipher().map(|c| c.name()).unwrap_or("<undef>"),
            peer = stream
                .ssl()
                .peer_certificate()
                .and_then(|cert| subject_cn(&cert))
                .as_deref()
                .unwrap_or("<undef>"),
            trust_policy = config.trust_policy(),
            "TLS handshake complete"
        );

        Ok(TlsSessionOps {
            stream,
            failed: false,
        })
    }

    /// Describe the certificate the peer presented, if any
    pub fn peer_certificate(&self) -> Result<Option<CertificateInfo>, TlsError> {
        self.stream
            .ssl()
            .peer_certificate()
            .map(|cert| CertificateInfo::from_x509(&cert))
            .transpose()
    }

    /// Negotiated protocol version (e.g. "TLSv1.2")
    pub fn version(&self) -> &'static str {
        self.stream.ssl().version_str()
    }

    /// Check if an I/O operation failed
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Get reference to underlying TCP stream
    pub fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }
}

impl SessionOps for TlsSessionOps {
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> io::Result<bool> {
        // Decrypted bytes may already be buffered inside OpenSSL
        if matches!(events, PollEvents::Read | PollEvents::Both) && self.stream.ssl().pending() > 0 {
            return Ok(true);
        }

        poll_fd(self.stream.get_ref().as_raw_fd(), events, timeout)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.read(buf) {
            Ok(n) => Ok(n),
            // Non-blocking drain: no complete record buffered yet
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(e),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream.write(buf) {
            Ok(n) => Ok(n),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().map_err(|e| {
            self.failed = true;
            e
        })
    }

    fn close(&mut self) -> io::Result<()> {
        // close_notify is best effort; the peer may already be gone
        if !self.failed {
            let _ = self.stream.shutdown();
        }

        shutdown_tcp(self.stream.get_ref())
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        self.stream.get_ref().set_nonblocking(nonblocking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::tls::TlsVersion;
    use openssl::pkey::PKey;
    use openssl::ssl::{SslAcceptor, SslMethod};
    use openssl::x509::X509;
    use std::net::TcpListener;
    use std::thread;

    const EXAMPLE_PEM: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/example.com.pem"
    ));

    fn acceptor() -> SslAcceptor {
        let cert = X509::from_pem(EXAMPLE_PEM.as_bytes()).unwrap();
        let key = PKey::private_key_from_pem(EXAMPLE_PEM.as_bytes()).unwrap();
        let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server()).unwrap();
        builder.set_certificate(&cert).unwrap();
        builder.set_private_key(&key).unwrap();
        builder.build()
    }

    #[test]
    fn test_handshake_with_self_signed_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let acceptor = acceptor();

        let server_handle = thread::spawn(move || {
            let (tcp_stream, _) = listener.accept().unwrap();
            let mut stream = acceptor.accept(tcp_stream).unwrap();

            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"Hello");
            stream.write_all(b"World").unwrap();
        });

        let config = TlsConfig::client().version(TlsVersion::Tls12).build().unwrap();
        let tcp_stream = TcpStream::connect(addr).unwrap();
        let mut session = config.connect(tcp_stream).unwrap();

        assert!(!session.failed());
        assert_eq!(session.version(), "TLSv1.2");

        assert_eq!(session.write(b"Hello").unwrap(), 5);
        let mut buf = [0u8; 5];
        assert!(session.poll(PollEvents::Read, Some(Duration::from_secs(2))).unwrap());
        let n = session.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &b"World"[..n]);

        let cert = session.peer_certificate().unwrap().unwrap();
        assert_eq!(cert.common_name(), Some("example.com"));

        server_handle.join().unwrap();
        session.close().unwrap();
    }

    #[test]
    fn test_nonblocking_read_skips_session_tickets() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let acceptor = acceptor();

        let server_handle = thread::spawn(move || {
            let (tcp_stream, _) = listener.accept().unwrap();
            let mut stream = acceptor.accept(tcp_stream).unwrap();
            let mut buf = [0u8; 5];
            let _ = stream.read_exact(&mut buf);
            thread::sleep(Duration::from_millis(500));
        });

        let config = TlsConfig::client().version(TlsVersion::Tls13).build().unwrap();
        let tcp_stream = TcpStream::connect(addr).unwrap();
        tcp_stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut session = config.connect(tcp_stream).unwrap();
        session.write(b"Hello").unwrap();
        thread::sleep(Duration::from_millis(50));

        // Only TLS 1.3 session tickets are on the wire; no application data
        session.set_nonblocking(true).unwrap();
        let started = std::time::Instant::now();
        let mut buf = [0u8; 16];
        let err = session.read(&mut buf).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert!(started.elapsed() < Duration::from_millis(300));
        assert!(!session.failed());

        server_handle.join().unwrap();
    }

    #[test]
    fn test_handshake_against_plain_listener_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server_handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(b"HTTP/1.0 400 Bad Request\r\n\r\n");
        });

        let config = TlsConfig::client().build().unwrap();
        let tcp_stream = TcpStream::connect(addr).unwrap();
        let err = config.connect(tcp_stream).unwrap_err();

        assert!(matches!(err, TlsError::HandshakeFailed(_)));
        server_handle.join().unwrap();
    }
}
