//! Blocking task API client with dual-endpoint request routing.
//!
//! # Overview
//! Application code issues requests through `Router::send` (or the
//! higher-level `TodoApi`) and never addresses the two backing endpoints
//! directly. The router forwards to the primary, mirrors successful writes
//! to the secondary, and falls back to the secondary when the primary cannot
//! be reached at all.
//!
//! # Design
//! - `TaskClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network; paths are relative so a request
//!   can be replayed against either endpoint.
//! - `Transport` is the only I/O seam. `UreqTransport` is the real one; tests
//!   substitute scripted transports.
//! - `Outcome` tags every result as success, application error or transport
//!   error, and only the last one is eligible for fallback.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod router;
pub mod transport;
pub mod types;

pub use api::TodoApi;
pub use client::TaskClient;
pub use config::Config;
pub use error::{ApiError, TransportError, TransportErrorKind};
pub use health::{HealthHandle, HealthMonitor};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use router::{Endpoint, MirrorMode, Outcome, RoutePolicy, Router};
pub use transport::{Transport, UreqTransport};
pub use types::{CreateTask, PatchTask, Task, UpdateTask};
