//! Test servers shared by the integration tests
//!
//! Each server accepts exactly one connection, records what the client sent,
//! replies with a canned response and hangs up.

#![allow(dead_code)]

use openssl::pkey::PKey;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::X509;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const EXAMPLE_PEM: &str = include_str!("../fixtures/example.com.pem");

/// One-shot plain TCP server; the handle yields the bytes it received
pub fn plain_server(response: &'static [u8]) -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).unwrap_or(0);
        buf.truncate(n);

        let _ = stream.write_all(response);
        buf
    });

    (port, handle)
}

/// Server that accepts and then sends nothing until the client leaves
pub fn silent_server() -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
    });

    (port, handle)
}

pub fn acceptor() -> SslAcceptor {
    let cert = X509::from_pem(EXAMPLE_PEM.as_bytes()).unwrap();
    let key = PKey::private_key_from_pem(EXAMPLE_PEM.as_bytes()).unwrap();

    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server()).unwrap();
    builder.set_certificate(&cert).unwrap();
    builder.set_private_key(&key).unwrap();
    builder.build()
}

/// One-shot TLS server using the self-signed example.com certificate
///
/// The handle yields the decrypted request bytes, or `None` if the
/// handshake never completed.
pub fn tls_server(response: &'static [u8]) -> (u16, JoinHandle<Option<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let acceptor = acceptor();

    let handle = thread::spawn(move || {
        let (tcp_stream, _) = listener.accept().unwrap();
        tcp_stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let mut stream = acceptor.accept(tcp_stream).ok()?;

        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).unwrap_or(0);
        buf.truncate(n);

        let _ = stream.write_all(response);
        let _ = stream.shutdown();
        Some(buf)
    });

    (port, handle)
}

/// TLS server that answers only after `delay`, well past the settle delay
pub fn late_tls_server(response: &'static [u8], delay: Duration) -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let acceptor = acceptor();

    let handle = thread::spawn(move || {
        let (tcp_stream, _) = listener.accept().unwrap();
        tcp_stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let Ok(mut stream) = acceptor.accept(tcp_stream) else {
            return;
        };

        let mut buf = vec![0u8; 8192];
        let _ = stream.read(&mut buf);
        thread::sleep(delay);
        // The client is normally gone by now
        let _ = stream.write_all(response);
    });

    (port, handle)
}
