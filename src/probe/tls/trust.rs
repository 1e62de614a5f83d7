//! Certificate trust policies

use openssl::x509::X509StoreContextRef;

/// Decides whether a certificate presented during the handshake is trusted
///
/// Called once per certificate in the chain, as OpenSSL walks it.
/// `preverified` is OpenSSL's own verdict for that certificate.
pub trait TrustPolicy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Return true to accept the certificate
    fn verify(&self, preverified: bool, ctx: &mut X509StoreContextRef) -> bool;
}

/// Insecure policy: every chain is accepted, whatever OpenSSL thinks of it
///
/// Used by every probe. Expired, self-signed and mismatched certificates all
/// pass; the certificate is still available for reporting afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyCertificate;

impl TrustPolicy for AcceptAnyCertificate {
    fn name(&self) -> &'static str {
        "accept-any-certificate"
    }

    fn verify(&self, preverified: bool, ctx: &mut X509StoreContextRef) -> bool {
        if !preverified {
            tracing::trace!(
                depth = ctx.error_depth(),
                reason = %ctx.error(),
                "accepting certificate that failed verification"
            );
        }
        true
    }
}
