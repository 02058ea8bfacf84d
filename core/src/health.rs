//! Background health monitoring for one endpoint.
//!
//! # Overview
//! A `HealthMonitor` checks `GET {endpoint}{health_path}` on a fixed interval,
//! keeps the latest result in a shared flag and counts healthy-to-unhealthy
//! transitions. It is purely observational: `Router::send` never consults it.
//!
//! # Design
//! - The crate is blocking, so the loop runs on its own thread and waits on
//!   `mpsc::Receiver::recv_timeout`; a message or a dropped sender stops it.
//! - Intervals below `MIN_CHECK_INTERVAL` are raised to it so a zero
//!   interval cannot turn the loop into a busy spin.
//! - Transitions are logged once per edge (`outage`, `recovery`).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::http::{HttpMethod, HttpRequest};
use crate::router::{Endpoint, Outcome};
use crate::transport::Transport;

/// Lower bound applied to every check interval.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Periodic health check for one endpoint.
///
/// Tracks the latest check result and counts healthy-to-unhealthy
/// transitions. Purely observational: the router never consults it.
pub struct HealthMonitor<T> {
    label: String,
    endpoint: Endpoint,
    health_path: String,
    check_interval: Duration,
    transport: Arc<T>,
    current_state: Arc<AtomicBool>,
    outage_count: Arc<AtomicU64>,
}

impl<T: Transport + 'static> HealthMonitor<T> {
    /// Create a monitor that checks `GET {endpoint}{health_path}` every
    /// `check_interval` (at least `MIN_CHECK_INTERVAL`). The endpoint is
    /// assumed healthy until a check fails.
    pub fn new(
        label: &str,
        endpoint: Endpoint,
        health_path: &str,
        check_interval: Duration,
        transport: Arc<T>,
    ) -> Self {
        Self {
            label: label.to_string(),
            endpoint,
            health_path: health_path.to_string(),
            check_interval: check_interval.max(MIN_CHECK_INTERVAL),
            transport,
            current_state: Arc::new(AtomicBool::new(true)),
            outage_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Check once. Any 2xx counts as healthy.
    pub fn check(&self) -> bool {
        let url = self.endpoint.url_for(&self.health_path);
        let request = HttpRequest::new(HttpMethod::Get, self.health_path.clone());

        match Outcome::classify(self.transport.execute(&url, &request)) {
            Outcome::Success(response) => {
                tracing::trace!(endpoint = %self.label, status = response.status, "health check passed");
                true
            }
            Outcome::Application(response) => {
                tracing::warn!(
                    endpoint = %self.label,
                    url = %url,
                    status = response.status,
                    "health check returned non-success status"
                );
                false
            }
            Outcome::Transport(error) => {
                tracing::warn!(endpoint = %self.label, url = %url, error = %error, "health check failed");
                false
            }
        }
    }

    /// Check once and record the result, logging transitions.
    pub fn poll(&self) -> bool {
        let is_healthy = self.check();
        let was_healthy = self.current_state.swap(is_healthy, Ordering::SeqCst);

        if was_healthy && !is_healthy {
            let count = self.outage_count.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                event = "outage",
                endpoint = %self.label,
                total_outages = count,
                "endpoint became unhealthy"
            );
        } else if !was_healthy && is_healthy {
            tracing::info!(event = "recovery", endpoint = %self.label, "endpoint recovered");
        }
        is_healthy
    }

    /// Poll until `shutdown` fires or its sender is dropped.
    pub fn run(&self, shutdown: mpsc::Receiver<()>) {
        tracing::info!(
            endpoint = %self.label,
            url = %self.endpoint.base_url(),
            interval_ms = self.check_interval.as_millis() as u64,
            "starting health monitor"
        );

        loop {
            self.poll();
            match shutdown.recv_timeout(self.check_interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        tracing::info!(endpoint = %self.label, "health monitor stopped");
    }

    /// Run the poll loop on a background thread.
    pub fn spawn(self: Arc<Self>) -> std::io::Result<HealthHandle> {
        let (stop, shutdown) = mpsc::channel();
        let join = thread::Builder::new()
            .name(format!("health-{}", self.label))
            .spawn(move || self.run(shutdown))?;
        Ok(HealthHandle { stop, join })
    }

    pub fn is_healthy(&self) -> bool {
        self.current_state.load(Ordering::SeqCst)
    }

    pub fn outage_count(&self) -> u64 {
        self.outage_count.load(Ordering::Relaxed)
    }
}

/// Handle to a spawned monitor thread.
pub struct HealthHandle {
    stop: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl HealthHandle {
    /// Signal the loop to exit and wait for the thread.
    pub fn stop(self) {
        // A send error means the loop already exited.
        let _ = self.stop.send(());
        if self.join.join().is_err() {
            tracing::warn!("health monitor thread panicked");
        }
    }

    /// Wait for the thread without signalling it.
    pub fn join(self) {
        if self.join.join().is_err() {
            tracing::warn!("health monitor thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, TransportErrorKind};
    use crate::http::HttpResponse;
    use std::sync::Mutex;

    /// Replies from a script, repeating the last entry once exhausted.
    struct ScriptedHealth {
        script: Mutex<Vec<bool>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedHealth {
        fn new(script: &[bool]) -> Arc<Self> {
            let mut script = script.to_vec();
            script.reverse();
            Arc::new(Self {
                script: Mutex::new(script),
                urls: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for ScriptedHealth {
        fn execute(&self, url: &str, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            let mut script = self.script.lock().unwrap();
            let healthy = if script.len() > 1 {
                script.pop().unwrap()
            } else {
                script.last().copied().unwrap_or(true)
            };
            if healthy {
                Ok(HttpResponse::new(200, r#"{"status":"ok"}"#))
            } else {
                Err(TransportError::new(TransportErrorKind::Connect, url, "connection refused"))
            }
        }
    }

    fn monitor(backend: Arc<ScriptedHealth>) -> HealthMonitor<ScriptedHealth> {
        HealthMonitor::new(
            "secondary",
            Endpoint::new("http://localhost:6000/"),
            "/health",
            Duration::from_millis(10),
            backend,
        )
    }

    #[test]
    fn test_initial_state() {
        let monitor = monitor(ScriptedHealth::new(&[true]));

        assert!(monitor.is_healthy());
        assert_eq!(monitor.outage_count(), 0);
    }

    #[test]
    fn test_check_url() {
        let backend = ScriptedHealth::new(&[true]);
        let monitor = monitor(Arc::clone(&backend));

        assert!(monitor.check());
        assert_eq!(backend.urls.lock().unwrap()[0], "http://localhost:6000/health");
    }

    #[test]
    fn test_transitions_are_counted() {
        let monitor = monitor(ScriptedHealth::new(&[false, false, true, false]));

        assert!(!monitor.poll());
        assert_eq!(monitor.outage_count(), 1);
        assert!(!monitor.poll());
        assert_eq!(monitor.outage_count(), 1);
        assert!(monitor.poll());
        assert!(monitor.is_healthy());
        assert!(!monitor.poll());
        assert_eq!(monitor.outage_count(), 2);
        assert!(!monitor.is_healthy());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let monitor = HealthMonitor::new(
            "primary",
            Endpoint::new("http://localhost:5001"),
            "/health",
            Duration::ZERO,
            ScriptedHealth::new(&[true]),
        );

        assert_eq!(monitor.check_interval(), MIN_CHECK_INTERVAL);
    }

    #[test]
    fn test_spawned_monitor_stops() {
        let backend = ScriptedHealth::new(&[false]);
        let monitor = Arc::new(monitor(Arc::clone(&backend)));

        let handle = Arc::clone(&monitor).spawn().unwrap();
        while backend.urls.lock().unwrap().is_empty() {
            thread::sleep(Duration::from_millis(5));
        }
        handle.stop();

        assert!(!monitor.is_healthy());
        assert_eq!(monitor.outage_count(), 1);
    }
}
