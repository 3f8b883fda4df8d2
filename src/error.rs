//! Error types for certauth

use thiserror::Error;

/// Result type alias for certauth
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication errors.
///
/// Every variant is terminal for the current request: the cause is the
/// client's certificate data, which does not change between retries.
/// The middleware collapses all of them into one generic client-visible
/// response; callers that need the cause (logging, metrics) get it from
/// the variant itself or from [`Error::kind`].
#[derive(Error, Debug)]
pub enum Error {
    /// The connection carries no verified certificate chain at all —
    /// either there is no TLS session or verification produced zero chains.
    #[error("no certificate chain detected")]
    NoVerifiedChain,

    /// The transport's raw peer certificate diverges from the leaf of the
    /// first verified chain.
    #[error("first peer certificate does not match first verified chain leaf")]
    ChainMismatch,

    /// None of the certificate's organizational units are authorized for
    /// the requested route.
    #[error("certificate failed OU validation for {ous:?}")]
    OuRejected {
        /// The OUs that were present on the certificate.
        ous: Vec<String>,
    },

    /// The certificate's common name is not authorized for the requested
    /// route.
    #[error("certificate failed CN validation for {cn:?}")]
    CnRejected {
        /// The CN that was rejected.
        cn: String,
    },

    /// The verified leaf certificate could not be processed — malformed
    /// DER, an unreadable subject, or an identity that cannot be carried
    /// in an HTTP header.
    #[error("client certificate error: {0}")]
    Certificate(String),

    /// Invalid construction-time configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable snake_case label for this error kind.
    ///
    /// Intended for structured log fields and metric labels; the label set
    /// is part of the crate's public contract and does not change between
    /// patch releases.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoVerifiedChain => "no_verified_chain",
            Self::ChainMismatch => "chain_mismatch",
            Self::OuRejected { .. } => "ou_rejected",
            Self::CnRejected { .. } => "cn_rejected",
            Self::Certificate(_) => "certificate",
            Self::Config(_) => "config",
        }
    }
}
