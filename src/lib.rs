//! Client-certificate route authorization for axum.
//!
//! `certauth` authorizes inbound requests based on the Organizational Unit
//! and Common Name of the client's **already-verified** mutual-TLS
//! certificate chain. It sits behind the TLS stack as a composable
//! middleware step: handshakes, chain verification, revocation and routing
//! all stay with the surrounding transport and framework.
//!
//! # Architecture
//!
//! ```text
//! TCP connection
//!   → TLS handshake     (rustls verifies client cert against CA)
//!   → TlsSessionInfo    injected into request extensions by the acceptor
//!   → cert_auth_middleware
//!       chain presence → chain consistency → OU policy → CN policy
//!   → downstream handler  (identity header / AuthIdentity extension)
//! ```
//!
//! On any failure the configured responder answers the client (by default
//! a generic `403` with body `"Authentication Failed"`) and the downstream
//! handler never runs.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//!
//! use axum::{Router, middleware, routing::get};
//! use certauth::{AuthConfig, CertAuth, cert_auth_middleware};
//!
//! let config = AuthConfig {
//!     inject_header: true,
//!     allowed_ous: vec!["endpoint".into()],
//!     allowed_cns: vec!["client1".into()],
//!     ..AuthConfig::default()
//! };
//! let auth = Arc::new(CertAuth::from_config(&config).unwrap());
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello, world!" }))
//!     .layer(middleware::from_fn_with_state(auth, cert_auth_middleware));
//! ```
//!
//! Application-specific authorization plugs in through the
//! [`RoutePolicy`] trait; [`AllowListPolicy`] is the built-in
//! implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod policy;

pub use config::{AuthConfig, RouteRuleConfig};
pub use connection::TlsSessionInfo;
pub use engine::AuthEngine;
pub use error::{Error, Result};
pub use identity::{AuthIdentity, PeerIdentity};
pub use middleware::{CertAuth, FailureResponder, cert_auth_middleware};
pub use policy::{AllowListPolicy, RoutePolicy};
