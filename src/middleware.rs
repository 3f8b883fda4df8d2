//! Authentication middleware for axum
//!
//! Wraps a downstream handler behind the [`AuthEngine`]: on success the
//! request is forwarded (optionally stamped with the identity header), on
//! failure the configured failure responder produces the one and only
//! response and the downstream handler never runs.
//!
//! # Wiring
//!
//! ```ignore
//! let auth = Arc::new(CertAuth::from_config(&config)?);
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(middleware::from_fn_with_state(auth, cert_auth_middleware));
//! ```
//!
//! The TLS acceptor must insert a [`TlsSessionInfo`] into the request
//! extensions before the router runs; a request without one is treated
//! exactly like a request without a verified chain.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::connection::TlsSessionInfo;
use crate::engine::AuthEngine;
use crate::policy::{AllowListPolicy, RoutePolicy};
use crate::{Error, Result};

/// Produces the client-visible response for a rejected request.
///
/// The error is available so embedders can vary the response per cause;
/// the default responder deliberately ignores it and stays generic so the
/// client cannot tell which validation step failed.
pub type FailureResponder = Arc<dyn Fn(&Error) -> Response + Send + Sync>;

fn default_header_name() -> HeaderName {
    HeaderName::from_static("x-tls-auth")
}

fn default_failure_responder(_err: &Error) -> Response {
    (StatusCode::FORBIDDEN, "Authentication Failed").into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// CertAuth
// ─────────────────────────────────────────────────────────────────────────────

/// Certificate-authentication middleware state.
///
/// Built once at startup and shared across requests; immutable afterwards.
pub struct CertAuth {
    engine: AuthEngine,
    failure_responder: FailureResponder,
    inject_header: bool,
    header_name: HeaderName,
}

impl std::fmt::Debug for CertAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertAuth")
            .field("inject_header", &self.inject_header)
            .field("header_name", &self.header_name)
            .finish_non_exhaustive()
    }
}

impl CertAuth {
    /// Create the middleware state around a custom [`RoutePolicy`].
    ///
    /// Defaults: no header injection, header name `x-tls-auth`, and a
    /// generic `403 Forbidden` / `"Authentication Failed"` responder.
    #[must_use]
    pub fn new(policy: Arc<dyn RoutePolicy>) -> Self {
        Self {
            engine: AuthEngine::new(policy),
            failure_responder: Arc::new(default_failure_responder),
            inject_header: false,
            header_name: default_header_name(),
        }
    }

    /// Create the middleware state from configuration, judging requests
    /// with the built-in [`AllowListPolicy`] compiled from the same config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config.header_name` is not a valid
    /// HTTP header name.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let header_name = HeaderName::from_bytes(config.header_name.as_bytes())
            .map_err(|e| Error::Config(format!("invalid header name {:?}: {e}", config.header_name)))?;

        Ok(Self {
            engine: AuthEngine::new(Arc::new(AllowListPolicy::from_config(config))),
            failure_responder: Arc::new(default_failure_responder),
            inject_header: config.inject_header,
            header_name,
        })
    }

    /// Replace the failure responder.
    #[must_use]
    pub fn with_failure_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&Error) -> Response + Send + Sync + 'static,
    {
        self.failure_responder = Arc::new(responder);
        self
    }

    /// Enable or disable writing the authenticated identity into a request
    /// header before the downstream handler runs.
    #[must_use]
    pub fn with_header_injection(mut self, inject: bool) -> Self {
        self.inject_header = inject;
        self
    }

    /// Override the identity header name.
    #[must_use]
    pub fn with_header_name(mut self, name: HeaderName) -> Self {
        self.header_name = name;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Certificate-authentication middleware.
///
/// Attach with `middleware::from_fn_with_state(Arc<CertAuth>, …)`. The
/// route identifier passed to the policy is the router's matched route
/// template when available, otherwise the raw URI path.
pub async fn cert_auth_middleware(
    State(auth): State<Arc<CertAuth>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let route = matched_route(&request);

    let outcome = {
        let session = request.extensions().get::<TlsSessionInfo>();
        match session {
            // No TLS session handed over by the acceptor: same as a
            // connection without a verified chain.
            None => Err(Error::NoVerifiedChain),
            Some(session) => auth.engine.authenticate(session, &route),
        }
    };

    let identity = match outcome {
        Ok(identity) => identity,
        Err(err) => {
            warn!(route = %route, kind = err.kind(), error = %err, "client certificate rejected");
            return (auth.failure_responder)(&err);
        }
    };

    debug!(route = %route, identity = %identity, "client certificate authenticated");

    if auth.inject_header {
        let Ok(value) = HeaderValue::from_str(&identity.to_string()) else {
            let err = Error::Certificate(format!(
                "authenticated identity {identity:?} is not a valid header value"
            ));
            warn!(route = %route, kind = err.kind(), error = %err, "client certificate rejected");
            return (auth.failure_responder)(&err);
        };
        let headers = request.headers_mut();
        // Strip first: no client-supplied value may survive under this name.
        headers.remove(&auth.header_name);
        headers.insert(auth.header_name.clone(), value);
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// The route identifier for policy decisions: the matched route template
/// when the router recorded one, the raw URI path otherwise.
fn matched_route(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_owned(), |p| p.as_str().to_owned())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
