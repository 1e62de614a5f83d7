//! rawprobe - direct HTTP probing
//!
//! This crate sends caller-built HTTP requests straight to an address and
//! port, optionally over TLS without certificate validation, and reports the
//! raw exchange as a structured result.

pub mod probe;

pub use probe::{probe, ProbeConfig, ProbeResult, Prober, RequestSpec};
