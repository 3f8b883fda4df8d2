//! Route authorization policy.
//!
//! [`RoutePolicy`] is the extension point of the crate: the engine extracts
//! the certificate identity and asks the policy whether it is authorized
//! for the requested route. Embedders supply their own implementation
//! (static allow-lists, an external policy service, …); the engine depends
//! only on the contract shape.
//!
//! # Evaluation contract
//!
//! - `match_ou` sees **all** OUs on the certificate, in certificate order,
//!   and picks the one recorded as the canonical identity OU.
//! - `match_cn` is only consulted after `match_ou` succeeded.
//! - Both must be pure, deterministic, and safe for concurrent invocation;
//!   the engine adds no locking around them.
//!
//! [`AllowListPolicy`] is the built-in implementation: global OU/CN
//! pattern lists plus optional per-route overrides, compiled once at
//! startup.
//!
//! # Glob patterns
//!
//! | Pattern | Semantics |
//! |---------|-----------|
//! | `"*"` | matches everything |
//! | `"prefix*"` | prefix match |
//! | `"*suffix"` | suffix match |
//! | `"*contains*"` | contains match |
//! | `"exact"` | exact match |

use crate::config::{AuthConfig, RouteRuleConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Policy contract
// ─────────────────────────────────────────────────────────────────────────────

/// Decides whether a certificate identity is authorized for a route.
///
/// Routes are opaque to the engine: whatever identifier the routing layer
/// supplies (typically the matched route template) is passed through
/// untouched.
pub trait RoutePolicy: Send + Sync {
    /// Judge the certificate's OU list against `route`.
    ///
    /// Returns `Some(ou)` with the OU to record as the canonical identity
    /// when any entry is authorized, `None` when none is.
    fn match_ou(&self, ous: &[String], route: &str) -> Option<String>;

    /// Judge the certificate's CN against `route`.
    fn match_cn(&self, cn: &str, route: &str) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in allow-list policy
// ─────────────────────────────────────────────────────────────────────────────

/// Static allow-list policy compiled from [`AuthConfig`].
///
/// Build once at startup with [`AllowListPolicy::from_config`]; evaluation
/// is read-only afterwards. Per-route rules are checked in configuration
/// order and the first rule whose route pattern matches wins; routes with
/// no matching rule use the global lists. Empty pattern lists fail closed.
#[derive(Debug, Clone)]
pub struct AllowListPolicy {
    global: CompiledLists,
    routes: Vec<CompiledRouteRule>,
}

impl AllowListPolicy {
    /// Compile the allow-list rules from configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            global: CompiledLists::new(&config.allowed_ous, &config.allowed_cns),
            routes: config.routes.iter().map(CompiledRouteRule::from_config).collect(),
        }
    }

    /// The pattern lists applicable to `route`.
    fn lists_for(&self, route: &str) -> &CompiledLists {
        self.routes
            .iter()
            .find(|rule| rule.route.matches(route))
            .map_or(&self.global, |rule| &rule.lists)
    }
}

impl RoutePolicy for AllowListPolicy {
    fn match_ou(&self, ous: &[String], route: &str) -> Option<String> {
        let lists = self.lists_for(route);
        ous.iter()
            .find(|ou| lists.ous.iter().any(|p| p.matches(ou)))
            .cloned()
    }

    fn match_cn(&self, cn: &str, route: &str) -> bool {
        self.lists_for(route).cns.iter().any(|p| p.matches(cn))
    }
}

#[derive(Debug, Clone)]
struct CompiledRouteRule {
    route: GlobPattern,
    lists: CompiledLists,
}

impl CompiledRouteRule {
    fn from_config(rule: &RouteRuleConfig) -> Self {
        Self {
            route: GlobPattern::new(&rule.route),
            lists: CompiledLists::new(&rule.allowed_ous, &rule.allowed_cns),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledLists {
    ous: Vec<GlobPattern>,
    cns: Vec<GlobPattern>,
}

impl CompiledLists {
    fn new(ous: &[String], cns: &[String]) -> Self {
        Self {
            ous: ous.iter().map(|s| GlobPattern::new(s)).collect(),
            cns: cns.iter().map(|s| GlobPattern::new(s)).collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Glob pattern
// ─────────────────────────────────────────────────────────────────────────────

/// A compiled glob pattern supporting `*`, `prefix*`, `*suffix`, `*mid*`,
/// and exact matches.
#[derive(Debug, Clone)]
enum GlobPattern {
    Wildcard,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl GlobPattern {
    fn new(s: &str) -> Self {
        let starts_star = s.starts_with('*');
        let ends_star = s.ends_with('*');

        if s == "*" {
            return Self::Wildcard;
        }
        match (starts_star, ends_star) {
            (true, true) => {
                let inner = &s[1..s.len() - 1];
                if inner.is_empty() {
                    Self::Wildcard
                } else {
                    Self::Contains(inner.to_string())
                }
            }
            (true, false) => Self::Suffix(s[1..].to_string()),
            (false, true) => Self::Prefix(s[..s.len() - 1].to_string()),
            (false, false) => Self::Exact(s.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Exact(e) => name == e,
            Self::Prefix(p) => name.starts_with(p.as_str()),
            Self::Suffix(s) => name.ends_with(s.as_str()),
            Self::Contains(c) => name.contains(c.as_str()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
