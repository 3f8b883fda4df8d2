//! Configuration types.
//!
//! Defines the deserialisable configuration for the middleware: identity
//! header injection and the allow-list rules compiled into the built-in
//! [`AllowListPolicy`](crate::policy::AllowListPolicy).
//!
//! # Example YAML
//!
//! ```yaml
//! cert_auth:
//!   inject_header: true
//!   header_name: "x-tls-auth"
//!   allowed_ous: ["endpoint"]
//!   allowed_cns: ["client1"]
//!   routes:
//!     - route: "/admin/*"
//!       allowed_ous: ["ops"]
//!       allowed_cns: ["*"]
//! ```

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level config
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level certificate-authentication configuration block.
///
/// Immutable after construction; build the middleware from it once at
/// startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// When `true`, the authenticated identity (`"<OU>/<CN>"`) is written
    /// into a request header before the downstream handler runs. Any value
    /// the client pre-set under that name is stripped first.
    pub inject_header: bool,

    /// Name of the identity header. Header names are case-insensitive on
    /// the wire; the default is `X-TLS-Auth`.
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// OU patterns authorized for every route without a more specific
    /// rule. Supports `"*"` wildcard and glob variants.
    #[serde(default)]
    pub allowed_ous: Vec<String>,

    /// CN patterns authorized for every route without a more specific
    /// rule. Supports `"*"` wildcard and glob variants.
    #[serde(default)]
    pub allowed_cns: Vec<String>,

    /// Per-route overrides, evaluated in order; the **first rule whose
    /// route pattern matches wins**. Routes without a matching rule fall
    /// back to the global lists above.
    #[serde(default)]
    pub routes: Vec<RouteRuleConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            inject_header: false,
            header_name: default_header_name(),
            allowed_ous: Vec::new(),
            allowed_cns: Vec::new(),
            routes: Vec::new(),
        }
    }
}

fn default_header_name() -> String {
    "x-tls-auth".to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-route rule config
// ─────────────────────────────────────────────────────────────────────────────

/// One per-route allow-list rule.
///
/// An empty `allowed_ous` or `allowed_cns` list in a matching rule denies
/// every certificate for that check (fail-closed) — it does **not** fall
/// back to the global lists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RouteRuleConfig {
    /// Route pattern this rule applies to. Supports `"*"` wildcard and
    /// glob variants; matched against the router's route template.
    pub route: String,

    /// OU patterns authorized for this route.
    pub allowed_ous: Vec<String>,

    /// CN patterns authorized for this route.
    pub allowed_cns: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_does_not_inject_header() {
        // GIVEN: default-constructed config
        let cfg = AuthConfig::default();
        // THEN: requests are forwarded unmodified
        assert!(!cfg.inject_header);
    }

    #[test]
    fn default_header_name_is_x_tls_auth() {
        let cfg = AuthConfig::default();
        assert_eq!(cfg.header_name, "x-tls-auth");
    }

    #[test]
    fn header_name_default_applies_when_omitted_in_yaml() {
        // GIVEN: YAML that enables injection but names no header
        let yaml = "inject_header: true";
        let cfg: AuthConfig = serde_yaml::from_str(yaml).unwrap();
        // THEN: the default name is filled in
        assert!(cfg.inject_header);
        assert_eq!(cfg.header_name, "x-tls-auth");
    }

    #[test]
    fn allow_lists_default_to_empty() {
        let cfg = AuthConfig::default();
        assert!(cfg.allowed_ous.is_empty());
        assert!(cfg.allowed_cns.is_empty());
        assert!(cfg.routes.is_empty());
    }

    #[test]
    fn full_config_deserialises_from_yaml() {
        // GIVEN: a complete config block
        let yaml = r#"
inject_header: true
header_name: "x-client-identity"
allowed_ous: ["endpoint"]
allowed_cns: ["client1", "client2"]
routes:
  - route: "/admin/*"
    allowed_ous: ["ops"]
    allowed_cns: ["*"]
"#;
        let cfg: AuthConfig = serde_yaml::from_str(yaml).unwrap();
        // THEN: fields parsed correctly
        assert!(cfg.inject_header);
        assert_eq!(cfg.header_name, "x-client-identity");
        assert_eq!(cfg.allowed_ous, &["endpoint"]);
        assert_eq!(cfg.allowed_cns.len(), 2);
        assert_eq!(cfg.routes.len(), 1);
        assert_eq!(cfg.routes[0].route, "/admin/*");
        assert_eq!(cfg.routes[0].allowed_ous, &["ops"]);
    }

    #[test]
    fn route_rule_fields_all_default_to_empty() {
        let rule: RouteRuleConfig = serde_yaml::from_str("route: \"/\"").unwrap();
        assert_eq!(rule.route, "/");
        assert!(rule.allowed_ous.is_empty());
        assert!(rule.allowed_cns.is_empty());
    }
}
