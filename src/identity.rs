//! Certificate identity extraction.
//!
//! Parses the DER-encoded leaf of an already-verified chain and extracts the
//! subject fields the policy layer matches on: the ordered Organizational
//! Unit list and the Common Name.
//!
//! # No unsafe
//!
//! `x509-parser` performs minimal `unsafe` internally for ASN.1 parsing;
//! this module itself contains no `unsafe` code and simply calls the safe
//! public API.

use std::fmt;

use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Peer identity
// ─────────────────────────────────────────────────────────────────────────────

/// Subject fields extracted from a verified client certificate.
///
/// Ephemeral, derived per request, never stored by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerIdentity {
    /// Organizational Units (OU) of the subject, in certificate order.
    /// A certificate may carry several.
    pub organizational_units: Vec<String>,

    /// Subject Common Name (CN). Empty when the certificate has none;
    /// policy implementations are expected to reject the empty string.
    pub common_name: String,
}

impl PeerIdentity {
    /// Parse a DER-encoded certificate and extract its subject fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Certificate`] if the bytes are not a parseable
    /// X.509 certificate. With a leaf that already passed chain
    /// verification upstream this indicates a transport bug, not routine
    /// client behaviour.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse client certificate: {e}")))?;

        Ok(Self {
            organizational_units: extract_ous(&cert),
            common_name: extract_cn(&cert).unwrap_or_default(),
        })
    }
}

/// Extract the CN attribute from the subject DN.
fn extract_cn(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

/// Extract every OU attribute from the subject DN, in certificate order.
/// Attributes that are not representable as UTF-8 strings are skipped.
fn extract_ous(cert: &X509Certificate<'_>) -> Vec<String> {
    cert.subject()
        .iter_organizational_unit()
        .filter_map(|attr| attr.as_str().ok())
        .map(str::to_owned)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Authenticated identity
// ─────────────────────────────────────────────────────────────────────────────

/// The identity produced by a successful authentication: the OU the policy
/// matched and the certificate CN.
///
/// Renders as `"<matchedOU>/<CN>"` — the value carried in the identity
/// header and available to downstream handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// The single OU the policy selected as canonical for this request.
    pub organizational_unit: String,

    /// The certificate Common Name.
    pub common_name: String,
}

impl fmt::Display for AuthIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organizational_unit, self.common_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
