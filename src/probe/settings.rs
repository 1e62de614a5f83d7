//! Probe request settings
//!
//! A [`RequestSpec`] describes one probe: where to connect, whether to use
//! TLS, and the exact bytes to send. Defaults are applied here and nowhere
//! else.

use super::tls::TlsVersion;
use super::DEFAULT_WAIT_MS;
use serde::Serialize;

/// Caller-supplied description of a single probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    address: String,
    port: u16,
    #[serde(skip)]
    request: Vec<u8>,
    use_tls: bool,
    tls_version: TlsVersion,
    include_certificate: bool,
    full_response: bool,
    wait_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_name: Option<String>,
}

impl RequestSpec {
    /// Create a plain-TCP spec with every optional field at its default
    pub fn new(address: impl Into<String>, port: u16, request: impl Into<Vec<u8>>) -> Self {
        RequestSpec {
            address: address.into(),
            port,
            request: request.into(),
            use_tls: false,
            tls_version: TlsVersion::default(),
            include_certificate: false,
            full_response: false,
            wait_ms: DEFAULT_WAIT_MS,
            server_name: None,
        }
    }

    /// Start building a spec
    pub fn builder(
        address: impl Into<String>,
        port: u16,
        request: impl Into<Vec<u8>>,
    ) -> RequestSpecBuilder {
        RequestSpecBuilder {
            spec: RequestSpec::new(address, port, request),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The raw request bytes, exactly as they will be written
    pub fn request(&self) -> &[u8] {
        &self.request
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn tls_version(&self) -> TlsVersion {
        self.tls_version
    }

    pub fn include_certificate(&self) -> bool {
        self.include_certificate
    }

    pub fn full_response(&self) -> bool {
        self.full_response
    }

    pub fn wait_ms(&self) -> u64 {
        self.wait_ms
    }

    /// Explicit SNI name, if one was set
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// `address:port`, with brackets around IPv6 literals
    pub fn target(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

/// Builder for [`RequestSpec`]
#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    spec: RequestSpec,
}

impl RequestSpecBuilder {
    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.spec.use_tls = use_tls;
        self
    }

    pub fn tls_version(mut self, version: TlsVersion) -> Self {
        self.spec.tls_version = version;
        self
    }

    pub fn include_certificate(mut self, include: bool) -> Self {
        self.spec.include_certificate = include;
        self
    }

    pub fn full_response(mut self, full: bool) -> Self {
        self.spec.full_response = full;
        self
    }

    pub fn wait_ms(mut self, wait_ms: u64) -> Self {
        self.spec.wait_ms = wait_ms;
        self
    }

    /// Send this name in the TLS SNI extension instead of the address
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.spec.server_name = Some(name.into());
        self
    }

    pub fn build(self) -> RequestSpec {
        self.spec
    }
}
