//! Dual-endpoint request routing.
//!
//! # Overview
//! `Router::send` issues every request to the primary endpoint and
//! coordinates the secondary endpoint behind the caller's back:
//!
//! - primary 2xx on a mirrored method: the same request is replayed against
//!   the secondary, its result logged and discarded;
//! - primary non-2xx: returned unchanged, secondary untouched;
//! - primary unreachable on a fallback method: the request is replayed once
//!   against the secondary and a 2xx from it is returned as if it came from
//!   the primary. Otherwise the original transport error is returned.
//!
//! # Design
//! The router holds no mutable state. The transport is shared through an
//! `Arc` so a detached mirror thread can outlive the `send` call that
//! spawned it.

use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// A base URL that request paths are joined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
}

impl Endpoint {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

/// Result of a routed request, tagged by failure class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A response with status in `[200, 300)`.
    Success(HttpResponse),
    /// A response with any other status.
    Application(HttpResponse),
    /// No response at all.
    Transport(TransportError),
}

impl Outcome {
    pub fn classify(result: Result<HttpResponse, TransportError>) -> Self {
        match result {
            Ok(response) if response.is_success() => Outcome::Success(response),
            Ok(response) => Outcome::Application(response),
            Err(error) => Outcome::Transport(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<HttpResponse, ApiError> {
        match self {
            Outcome::Success(response) => Ok(response),
            Outcome::Application(response) => {
                Err(ApiError::from_status(response.status, response.body))
            }
            Outcome::Transport(error) => Err(ApiError::Transport(error)),
        }
    }
}

/// Which methods are mirrored on success and which may fall back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    mirrored: Vec<HttpMethod>,
    fallback: Vec<HttpMethod>,
}

impl Default for RoutePolicy {
    /// Mirror mutating methods; any method may fall back.
    fn default() -> Self {
        Self {
            mirrored: HttpMethod::ALL.into_iter().filter(|m| m.is_mutating()).collect(),
            fallback: HttpMethod::ALL.to_vec(),
        }
    }
}

impl RoutePolicy {
    /// Mirror every successful request, reads included, and never fall back.
    pub fn mirror_all() -> Self {
        Self {
            mirrored: HttpMethod::ALL.to_vec(),
            fallback: Vec::new(),
        }
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback.clear();
        self
    }

    pub fn mirrors(&self, method: HttpMethod) -> bool {
        self.mirrored.contains(&method)
    }

    pub fn falls_back(&self, method: HttpMethod) -> bool {
        self.fallback.contains(&method)
    }
}

/// How the mirror call relates to the caller's `send`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MirrorMode {
    /// Run the mirror on its own thread; `send` returns immediately.
    #[default]
    Detach,
    /// Run the mirror inline and discard its result before returning.
    Await,
}

pub struct Router<T> {
    primary: Endpoint,
    secondary: Endpoint,
    transport: Arc<T>,
    policy: RoutePolicy,
    mirror_mode: MirrorMode,
}

impl Router<UreqTransport> {
    pub fn from_config(config: &Config) -> Self {
        Router::new(
            Endpoint::new(&config.primary_url),
            Endpoint::new(&config.secondary_url),
            UreqTransport::with_timeout(config.request_timeout()),
        )
        .with_policy(config.route_policy())
        .with_mirror_mode(config.mirror_mode())
    }
}

impl<T: Transport + 'static> Router<T> {
    pub fn new(primary: Endpoint, secondary: Endpoint, transport: T) -> Self {
        Self {
            primary,
            secondary,
            transport: Arc::new(transport),
            policy: RoutePolicy::default(),
            mirror_mode: MirrorMode::default(),
        }
    }

    pub fn with_policy(mut self, policy: RoutePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mirror_mode(mut self, mirror_mode: MirrorMode) -> Self {
        self.mirror_mode = mirror_mode;
        self
    }

    pub fn primary(&self) -> &Endpoint {
        &self.primary
    }

    pub fn secondary(&self) -> &Endpoint {
        &self.secondary
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn send(&self, request: &HttpRequest) -> Outcome {
        let url = self.primary.url_for(&request.path);
        tracing::debug!(method = %request.method, url = %url, "sending to primary");

        match Outcome::classify(self.transport.execute(&url, request)) {
            Outcome::Success(response) => {
                if self.policy.mirrors(request.method) {
                    self.mirror(request);
                }
                Outcome::Success(response)
            }
            Outcome::Transport(error) if self.policy.falls_back(request.method) => {
                self.fall_back(request, error)
            }
            other => other,
        }
    }

    fn fall_back(&self, request: &HttpRequest, primary_error: TransportError) -> Outcome {
        let url = self.secondary.url_for(&request.path);
        tracing::warn!(
            method = %request.method,
            url = %url,
            error = %primary_error,
            "primary unreachable, falling back to secondary"
        );

        match Outcome::classify(self.transport.execute(&url, request)) {
            Outcome::Success(response) => {
                tracing::info!(
                    method = %request.method,
                    url = %url,
                    status = response.status,
                    "fallback succeeded"
                );
                Outcome::Success(response)
            }
            Outcome::Application(response) => {
                tracing::warn!(
                    method = %request.method,
                    url = %url,
                    status = response.status,
                    "fallback rejected by secondary"
                );
                Outcome::Transport(primary_error)
            }
            Outcome::Transport(error) => {
                tracing::warn!(
                    method = %request.method,
                    url = %url,
                    error = %error,
                    "fallback failed"
                );
                Outcome::Transport(primary_error)
            }
        }
    }

    fn mirror(&self, request: &HttpRequest) {
        let url = self.secondary.url_for(&request.path);
        match self.mirror_mode {
            MirrorMode::Await => mirror_call(self.transport.as_ref(), &url, request),
            MirrorMode::Detach => {
                let transport = Arc::clone(&self.transport);
                let request = request.clone();
                let spawned = thread::Builder::new()
                    .name("todo-mirror".to_string())
                    .spawn(move || mirror_call(transport.as_ref(), &url, &request));
                if let Err(e) = spawned {
                    tracing::warn!(error = %e, "failed to start mirror thread");
                }
            }
        }
    }
}

fn mirror_call<T: Transport + ?Sized>(transport: &T, url: &str, request: &HttpRequest) {
    match Outcome::classify(transport.execute(url, request)) {
        Outcome::Success(response) => {
            tracing::debug!(
                method = %request.method,
                url = %url,
                status = response.status,
                "mirror delivered"
            );
        }
        Outcome::Application(response) => {
            tracing::warn!(
                method = %request.method,
                url = %url,
                status = response.status,
                "mirror rejected by secondary"
            );
        }
        Outcome::Transport(error) => {
            tracing::warn!(
                method = %request.method,
                url = %url,
                error = %error,
                "mirror failed"
            );
        }
    }
}
