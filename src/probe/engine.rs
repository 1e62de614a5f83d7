//! Probe pipeline
//!
//! Runs connect, optional TLS upgrade, transmit, collect and parse in order
//! and folds the outcome into a [`ProbeResult`]. Errors never escape: the
//! first failure ends the pipeline and becomes status code 999 with an
//! exception string.

use super::config::ProbeConfig;
use super::connector;
use super::exchange;
use super::parser::{self, ParsedResponse};
use super::result::ProbeResult;
use super::session::{FdSessionOps, SessionOps};
use super::settings::RequestSpec;
use super::tls::{AcceptAnyCertificate, CertificateInfo, TlsConfig, TlsSessionOps};
use super::{ProbeStage, Result};
use chrono::Utc;
use std::net::{IpAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

/// Probe with the default configuration
pub fn probe(spec: &RequestSpec) -> ProbeResult {
    Prober::default().probe(spec)
}

/// Runs probes; holds only immutable configuration, so one instance can be
/// shared across threads
#[derive(Debug, Clone, Default)]
pub struct Prober {
    config: ProbeConfig,
}

struct Outcome {
    parsed: ParsedResponse,
    certificate: Option<CertificateInfo>,
    sent: usize,
    received: usize,
}

impl Prober {
    pub fn new(config: ProbeConfig) -> Self {
        Prober { config }
    }

    /// Prober configured from `RAWPROBE_*` environment variables
    pub fn from_env() -> Self {
        Prober::new(ProbeConfig::from_env())
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run one probe. Always returns a complete result.
    pub fn probe(&self, spec: &RequestSpec) -> ProbeResult {
        let result = ProbeResult::started(spec, Utc::now());

        let span = tracing::info_span!("probe", peer = %spec.target(), tls = spec.use_tls());
        let _enter = span.enter();

        let mut stage = ProbeStage::Initialized;
        match self.run(spec, &mut stage) {
            Ok(outcome) => {
                if let Some(ref ambiguity) = outcome.parsed.ambiguity {
                    tracing::warn!(error = %ambiguity, "status line not recognised, status code left unset");
                } else if outcome.received == 0 {
                    tracing::info!("no response received");
                }
                advance(&mut stage, ProbeStage::Completed);

                let result = result.complete(outcome.parsed, outcome.certificate);
                tracing::info!(
                    status = result.status_code(),
                    sent = outcome.sent,
                    received = outcome.received,
                    "probe complete"
                );
                result
            }
            Err(e) => {
                tracing::warn!(stage = %stage, error = %e, "probe failed");
                advance(&mut stage, ProbeStage::Failed);
                result.failed(&e)
            }
        }
    }

    fn run(&self, spec: &RequestSpec, stage: &mut ProbeStage) -> Result<Outcome> {
        advance(stage, ProbeStage::Connecting);
        let tcp = connector::connect(spec.address(), spec.port(), &self.config)?;

        // The session is owned here; any early return drops (and closes) it
        let (mut session, certificate): (Box<dyn SessionOps>, Option<CertificateInfo>) =
            if spec.use_tls() {
                advance(stage, ProbeStage::TlsHandshaking);
                let tls = upgrade(tcp, spec)?;
                let certificate = if spec.include_certificate() {
                    tls.peer_certificate()?
                } else {
                    None
                };
                (Box::new(tls), certificate)
            } else {
                (Box::new(FdSessionOps::new(tcp)), None)
            };

        advance(stage, ProbeStage::Transmitting);
        let sent = exchange::transmit(&mut session, spec.request())?;

        advance(stage, ProbeStage::Collecting);
        let raw = exchange::collect(&mut session, Duration::from_millis(spec.wait_ms()))?;
        drop(session);

        advance(stage, ProbeStage::Parsing);
        let parsed = parser::parse_response(&raw, spec.full_response());

        Ok(Outcome {
            parsed,
            certificate,
            sent,
            received: raw.len(),
        })
    }
}

fn upgrade(tcp: TcpStream, spec: &RequestSpec) -> Result<TlsSessionOps> {
    let mut builder = TlsConfig::client()
        .version(spec.tls_version())
        .trust_policy(Arc::new(AcceptAnyCertificate));

    if let Some(name) = sni_name(spec) {
        builder = builder.servername(name);
    }

    let config = builder.build()?;
    Ok(config.connect(tcp)?)
}

/// Explicit server name, else the address unless it is a literal IP
fn sni_name(spec: &RequestSpec) -> Option<String> {
    if let Some(name) = spec.server_name() {
        return Some(name.to_string());
    }

    let address = spec.address().trim_start_matches('[').trim_end_matches(']');
    if address.parse::<IpAddr>().is_ok() {
        None
    } else {
        Some(address.to_string())
    }
}

fn advance(stage: &mut ProbeStage, next: ProbeStage) {
    tracing::debug!(from = %stage, to = %next, "stage");
    *stage = next;
}
