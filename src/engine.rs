//! The authentication decision procedure.
//!
//! [`AuthEngine::authenticate`] runs a fixed sequence of fail-fast gates
//! over the verified-chain snapshot of one request and either produces the
//! authenticated identity or a typed error. It performs no I/O, holds no
//! per-request state, and has no side effects beyond invoking the policy —
//! responding to the client is the middleware's job, which keeps the
//! decision logic independently testable.

use std::sync::Arc;

use crate::connection::TlsSessionInfo;
use crate::identity::{AuthIdentity, PeerIdentity};
use crate::policy::RoutePolicy;
use crate::{Error, Result};

/// Stateless authentication engine.
///
/// Construct once at startup; safe for unbounded concurrent use — cloning
/// shares the underlying policy.
#[derive(Clone)]
pub struct AuthEngine {
    policy: Arc<dyn RoutePolicy>,
}

impl AuthEngine {
    /// Create an engine judging requests with `policy`.
    #[must_use]
    pub fn new(policy: Arc<dyn RoutePolicy>) -> Self {
        Self { policy }
    }

    /// Authenticate one request.
    ///
    /// Gates, in order, each terminal on failure:
    ///
    /// 1. **Chain presence** — [`Error::NoVerifiedChain`] unless the session
    ///    carries at least one verified chain with a leaf certificate.
    /// 2. **Chain consistency** — when the transport exposed the raw peer
    ///    list, its first certificate must be byte-identical to the verified
    ///    leaf, else [`Error::ChainMismatch`]. Defends against transports
    ///    that present a different certificate than the one actually walked
    ///    during verification.
    /// 3. **OU evaluation** — the policy picks the canonical OU out of the
    ///    leaf's OU list, else [`Error::OuRejected`].
    /// 4. **CN evaluation** — only reached after the OU passed; the policy
    ///    judges the leaf's CN, else [`Error::CnRejected`].
    ///
    /// On success the identity is the matched OU and the certificate CN.
    pub fn authenticate(&self, session: &TlsSessionInfo, route: &str) -> Result<AuthIdentity> {
        let leaf = session.verified_leaf().ok_or(Error::NoVerifiedChain)?;

        if let Some(raw_leaf) = session.raw_peer_leaf() {
            if raw_leaf.as_ref() != leaf.as_ref() {
                return Err(Error::ChainMismatch);
            }
        }

        let peer = PeerIdentity::from_der(leaf.as_ref())?;

        let Some(matched_ou) = self.policy.match_ou(&peer.organizational_units, route) else {
            return Err(Error::OuRejected {
                ous: peer.organizational_units,
            });
        };

        if !self.policy.match_cn(&peer.common_name, route) {
            return Err(Error::CnRejected {
                cn: peer.common_name,
            });
        }

        Ok(AuthIdentity {
            organizational_unit: matched_ou,
            common_name: peer.common_name,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rcgen::string::Ia5String;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
    use rustls_pki_types::CertificateDer;

    use super::*;
    use crate::config::AuthConfig;
    use crate::policy::AllowListPolicy;

    // ── helpers ──────────────────────────────────────────────────────────────

    fn make_cert_der(cn: &str, ou: &str) -> CertificateDer<'static> {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationalUnitName, ou);
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        params.subject_alt_names =
            vec![SanType::DnsName(Ia5String::try_from(cn).unwrap())];
        let key_pair = KeyPair::generate().expect("key generation failed");
        let cert = params
            .self_signed(&key_pair)
            .expect("rcgen cert generation failed");
        CertificateDer::from(cert.der().to_vec())
    }

    fn allow_list(ous: &[&str], cns: &[&str]) -> Arc<AllowListPolicy> {
        let cfg = AuthConfig {
            allowed_ous: ous.iter().map(|s| (*s).to_owned()).collect(),
            allowed_cns: cns.iter().map(|s| (*s).to_owned()).collect(),
            ..AuthConfig::default()
        };
        Arc::new(AllowListPolicy::from_config(&cfg))
    }

    /// Policy stub that records which checks ran.
    struct RecordingPolicy {
        allow_ou: bool,
        allow_cn: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingPolicy {
        fn new(allow_ou: bool, allow_cn: bool) -> Arc<Self> {
            Arc::new(Self {
                allow_ou,
                allow_cn,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RoutePolicy for RecordingPolicy {
        fn match_ou(&self, ous: &[String], _route: &str) -> Option<String> {
            self.calls.lock().unwrap().push("ou");
            self.allow_ou.then(|| ous.first().cloned().unwrap_or_default())
        }

        fn match_cn(&self, _cn: &str, _route: &str) -> bool {
            self.calls.lock().unwrap().push("cn");
            self.allow_cn
        }
    }

    // ── chain presence ────────────────────────────────────────────────────────

    #[test]
    fn no_chains_is_rejected_before_policy_runs() {
        let policy = RecordingPolicy::new(true, true);
        let engine = AuthEngine::new(policy.clone());
        // GIVEN: a session with zero verified chains
        let session = TlsSessionInfo::new(vec![]);
        // THEN: NoVerifiedChain, and the policy was never consulted
        let err = engine.authenticate(&session, "/").unwrap_err();
        assert!(matches!(err, Error::NoVerifiedChain));
        assert!(policy.calls().is_empty());
    }

    #[test]
    fn empty_first_chain_is_rejected() {
        let engine = AuthEngine::new(allow_list(&["*"], &["*"]));
        let session = TlsSessionInfo::new(vec![vec![]]);
        let err = engine.authenticate(&session, "/").unwrap_err();
        assert!(matches!(err, Error::NoVerifiedChain));
    }

    // ── chain consistency ─────────────────────────────────────────────────────

    #[test]
    fn diverging_raw_peer_leaf_is_rejected() {
        let policy = RecordingPolicy::new(true, true);
        let engine = AuthEngine::new(policy.clone());
        let verified = make_cert_der("client1", "endpoint");
        let presented = make_cert_der("client1", "endpoint");
        // GIVEN: raw peer leaf differs byte-wise from the verified leaf
        // (same subject, fresh key — the chain-confusion case)
        let session =
            TlsSessionInfo::new(vec![vec![verified]]).with_peer_certificates(vec![presented]);
        let err = engine.authenticate(&session, "/").unwrap_err();
        assert!(matches!(err, Error::ChainMismatch));
        assert!(policy.calls().is_empty());
    }

    #[test]
    fn matching_raw_peer_leaf_passes_consistency() {
        let engine = AuthEngine::new(allow_list(&["endpoint"], &["client1"]));
        let leaf = make_cert_der("client1", "endpoint");
        let session = TlsSessionInfo::new(vec![vec![leaf.clone()]])
            .with_peer_certificates(vec![leaf]);
        assert!(engine.authenticate(&session, "/").is_ok());
    }

    #[test]
    fn absent_raw_peer_list_skips_consistency_check() {
        let engine = AuthEngine::new(allow_list(&["endpoint"], &["client1"]));
        let session = TlsSessionInfo::new(vec![vec![make_cert_der("client1", "endpoint")]]);
        assert!(engine.authenticate(&session, "/").is_ok());
    }

    // ── policy ordering ───────────────────────────────────────────────────────

    #[test]
    fn cn_is_never_evaluated_when_ou_fails() {
        let policy = RecordingPolicy::new(false, true);
        let engine = AuthEngine::new(policy.clone());
        let session = TlsSessionInfo::new(vec![vec![make_cert_der("client1", "intruder")]]);

        let err = engine.authenticate(&session, "/").unwrap_err();
        assert!(matches!(err, Error::OuRejected { .. }));
        // OU check ran, CN check was short-circuited
        assert_eq!(policy.calls(), vec!["ou"]);
    }

    #[test]
    fn ou_rejection_carries_the_attempted_ous() {
        let engine = AuthEngine::new(allow_list(&["endpoint"], &["*"]));
        let session = TlsSessionInfo::new(vec![vec![make_cert_der("client1", "intruder")]]);
        match engine.authenticate(&session, "/").unwrap_err() {
            Error::OuRejected { ous } => assert_eq!(ous, vec!["intruder"]),
            other => panic!("expected OuRejected, got {other:?}"),
        }
    }

    #[test]
    fn cn_rejection_after_ou_passed() {
        let policy = RecordingPolicy::new(true, false);
        let engine = AuthEngine::new(policy.clone());
        let session = TlsSessionInfo::new(vec![vec![make_cert_der("client2", "endpoint")]]);

        match engine.authenticate(&session, "/").unwrap_err() {
            Error::CnRejected { cn } => assert_eq!(cn, "client2"),
            other => panic!("expected CnRejected, got {other:?}"),
        }
        assert_eq!(policy.calls(), vec!["ou", "cn"]);
    }

    // ── success ───────────────────────────────────────────────────────────────

    #[test]
    fn identity_is_matched_ou_slash_cn() {
        let engine = AuthEngine::new(allow_list(&["endpoint"], &["client1"]));
        let session = TlsSessionInfo::new(vec![vec![make_cert_der("client1", "endpoint")]]);

        let identity = engine.authenticate(&session, "/").unwrap();
        assert_eq!(identity.organizational_unit, "endpoint");
        assert_eq!(identity.common_name, "client1");
        assert_eq!(identity.to_string(), "endpoint/client1");
    }

    #[test]
    fn repeated_authentication_is_idempotent() {
        let engine = AuthEngine::new(allow_list(&["endpoint"], &["client1"]));
        let session = TlsSessionInfo::new(vec![vec![make_cert_der("client1", "endpoint")]]);

        let first = engine.authenticate(&session, "/").unwrap();
        let second = engine.authenticate(&session, "/").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn only_the_first_chain_leaf_is_consulted() {
        let engine = AuthEngine::new(allow_list(&["endpoint"], &["client1"]));
        // Second chain would be rejected, but it is never looked at
        let session = TlsSessionInfo::new(vec![
            vec![make_cert_der("client1", "endpoint")],
            vec![make_cert_der("stranger", "intruder")],
        ]);
        assert!(engine.authenticate(&session, "/").is_ok());
    }
}
