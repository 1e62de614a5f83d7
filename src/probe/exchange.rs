//! Request transmission and response collection
//!
//! The request goes out byte for byte. The response is not framed: after a
//! fixed settle delay, whatever has arrived is drained without waiting for
//! more. Content-Length and chunked encoding are deliberately ignored.

use super::session::{PollEvents, SessionOps};
use super::{Error, Result, READ_CHUNK_SIZE};
use std::io;
use std::thread;
use std::time::Duration;

/// Write the raw request to the session exactly as given
///
/// Returns the number of bytes written, which is always `request.len()`.
pub fn transmit<S: SessionOps + ?Sized>(session: &mut S, request: &[u8]) -> Result<usize> {
    let mut written = 0;

    while written < request.len() {
        match session.write(&request[written..]) {
            Ok(0) => {
                return Err(Error::Write(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed while writing request",
                )));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Write(e)),
        }
    }

    session.flush().map_err(Error::Write)?;
    Ok(written)
}

/// Sleep for `settle`, drain what is available, then close the session
///
/// The drain runs with the socket in non-blocking mode. A readable socket
/// does not mean application data: TLS 1.3 session tickets arrive right
/// after the handshake, and a blocking read would consume them and then wait
/// for the response.
pub fn collect<S: SessionOps + ?Sized>(session: &mut S, settle: Duration) -> Result<Vec<u8>> {
    if !settle.is_zero() {
        thread::sleep(settle);
    }

    session.set_nonblocking(true).map_err(Error::Read)?;
    let raw = drain(session)?;

    if let Err(e) = session.close() {
        tracing::debug!(error = %e, "session close failed");
    }

    Ok(raw)
}

/// Read everything that can be read right now
///
/// Stops at end of stream, when nothing is ready, or when a read would
/// block. A failing read ends the drain quietly once some bytes have been
/// collected (peers often drop the connection right after responding);
/// before that it is a read error.
pub fn drain<S: SessionOps + ?Sized>(session: &mut S) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        if !session
            .poll(PollEvents::Read, Some(Duration::ZERO))
            .map_err(Error::Read)?
        {
            break;
        }

        match session.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => break,
            Err(e) if !raw.is_empty() => {
                tracing::debug!(error = %e, received = raw.len(), "read failed after response data, keeping it");
                break;
            }
            Err(e) => return Err(Error::Read(e)),
        }
    }

    Ok(raw)
}
