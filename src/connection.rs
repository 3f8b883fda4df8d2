//! Verified-chain snapshot handed over by the TLS transport.
//!
//! The crate never performs handshakes or chain verification itself; it is
//! invoked strictly *after* the transport has cryptographically verified the
//! peer. [`TlsSessionInfo`] is the hand-off point: the embedding acceptor
//! builds one from the connection it just finished verifying and inserts it
//! into the request extensions before the router runs.
//!
//! ```text
//! TCP connection
//!   → TLS handshake      (rustls verifies client cert against CA)
//!   → TlsSessionInfo     built from the verified connection
//!   → Injected into request extensions
//!   → [certauth middleware authenticates against it]
//! ```

use rustls_pki_types::CertificateDer;

// ─────────────────────────────────────────────────────────────────────────────
// TlsSessionInfo
// ─────────────────────────────────────────────────────────────────────────────

/// Certificate material of one verified TLS session.
///
/// Cloneable so it can live in `http::Extensions`; cloning copies the DER
/// bytes, which the acceptor does once per connection, not per request
/// field access.
///
/// # Scope limitation
///
/// Only the **first** verified chain's leaf (chain 0, certificate 0) is ever
/// consulted by the [`AuthEngine`](crate::engine::AuthEngine). Deployments
/// where a peer can present multiple simultaneously-valid leaf certificates
/// are explicitly unhandled.
#[derive(Debug, Clone)]
pub struct TlsSessionInfo {
    /// Verified chains, each ordered leaf-first toward a trusted root.
    verified_chains: Vec<Vec<CertificateDer<'static>>>,

    /// The raw certificate list the peer presented during the handshake,
    /// leaf-first, when the transport exposes it. Used only for the
    /// chain-consistency check.
    peer_certificates: Option<Vec<CertificateDer<'static>>>,
}

impl TlsSessionInfo {
    /// Build a session snapshot from the transport's verified chains.
    #[must_use]
    pub fn new(verified_chains: Vec<Vec<CertificateDer<'static>>>) -> Self {
        Self {
            verified_chains,
            peer_certificates: None,
        }
    }

    /// Attach the raw peer certificate list for the chain-consistency check.
    #[must_use]
    pub fn with_peer_certificates(mut self, certs: Vec<CertificateDer<'static>>) -> Self {
        self.peer_certificates = Some(certs);
        self
    }

    /// Build a snapshot from the certificate chain a rustls server
    /// connection exposes after a verified handshake.
    ///
    /// rustls surfaces exactly one chain — the one the peer presented and
    /// the verifier walked — so it serves as both the single verified chain
    /// and the raw peer list. Embedders on other transports construct via
    /// [`TlsSessionInfo::new`] instead.
    #[must_use]
    pub fn from_peer_certificates(certs: Vec<CertificateDer<'static>>) -> Self {
        Self {
            verified_chains: vec![certs.clone()],
            peer_certificates: Some(certs),
        }
    }

    /// The leaf certificate of the first verified chain, if any chain with
    /// at least one certificate exists.
    #[must_use]
    pub fn verified_leaf(&self) -> Option<&CertificateDer<'static>> {
        self.verified_chains.first().and_then(|chain| chain.first())
    }

    /// The first raw peer certificate, when the transport exposed a
    /// non-empty peer list.
    #[must_use]
    pub fn raw_peer_leaf(&self) -> Option<&CertificateDer<'static>> {
        self.peer_certificates
            .as_ref()
            .and_then(|certs| certs.first())
    }
}
