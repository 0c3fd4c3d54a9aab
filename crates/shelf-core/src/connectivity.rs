//! Network reachability monitoring.
//!
//! A [`ConnectivityMonitor`] polls a [`ConnectivityProbe`] on an interval and
//! publishes settled online/offline state on a `watch` channel. Subscribers
//! see the current state immediately and every settled transition after that.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::ShelfConfig;
use crate::Result;

/// Reachability state published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityEvent {
    pub online: bool,
}

/// Something that can answer "is the catalog service reachable right now".
#[allow(async_fn_in_trait)]
pub trait ConnectivityProbe {
    async fn is_reachable(&self) -> bool;
}

/// Probe that opens (and immediately drops) a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Probe the host of the configured catalog service.
    pub fn for_config(config: &ShelfConfig) -> Result<Self> {
        Ok(Self::new(config.api_socket_addr()?, Duration::from_secs(3)))
    }
}

impl ConnectivityProbe for TcpProbe {
    async fn is_reachable(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(error)) => {
                tracing::debug!("Reachability probe to {} failed: {error}", self.addr);
                false
            }
            Err(_) => {
                tracing::debug!("Reachability probe to {} timed out", self.addr);
                false
            }
        }
    }
}

/// Debounce state machine for raw probe results.
///
/// The first observation is published as-is. After that the published state
/// only flips once `settle_checks` consecutive observations agree on the new
/// value.
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    settle_checks: u32,
    state: Option<bool>,
    candidate: Option<bool>,
    streak: u32,
}

impl ConnectivityTracker {
    pub fn new(settle_checks: u32) -> Self {
        Self {
            settle_checks: settle_checks.max(1),
            state: None,
            candidate: None,
            streak: 0,
        }
    }

    /// Last published state, if any observation has been made.
    pub const fn current(&self) -> Option<bool> {
        self.state
    }

    /// Feed one raw probe result. Returns an event when the published state changes.
    pub fn observe(&mut self, reachable: bool) -> Option<ConnectivityEvent> {
        let Some(current) = self.state else {
            self.state = Some(reachable);
            return Some(ConnectivityEvent { online: reachable });
        };

        if current == reachable {
            self.candidate = None;
            self.streak = 0;
            return None;
        }

        if self.candidate == Some(reachable) {
            self.streak += 1;
        } else {
            self.candidate = Some(reachable);
            self.streak = 1;
        }

        if self.streak < self.settle_checks {
            return None;
        }

        self.state = Some(reachable);
        self.candidate = None;
        self.streak = 0;
        Some(ConnectivityEvent { online: reachable })
    }
}

/// Polls a probe and publishes settled reachability.
pub struct ConnectivityMonitor<P> {
    probe: P,
    interval: Duration,
    tracker: ConnectivityTracker,
    sender: watch::Sender<ConnectivityEvent>,
}

impl<P: ConnectivityProbe> ConnectivityMonitor<P> {
    /// Probe once to establish the initial state, then return the monitor.
    pub async fn start(probe: P, interval: Duration, settle_checks: u32) -> Self {
        let mut tracker = ConnectivityTracker::new(settle_checks);
        let reachable = probe.is_reachable().await;
        let initial = tracker
            .observe(reachable)
            .unwrap_or(ConnectivityEvent { online: reachable });
        let (sender, _receiver) = watch::channel(initial);

        tracing::info!(
            "Connectivity monitor started ({})",
            if initial.online { "online" } else { "offline" }
        );

        Self {
            probe,
            interval,
            tracker,
            sender,
        }
    }

    /// Subscribe to reachability; the receiver holds the current state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityEvent> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> ConnectivityEvent {
        *self.sender.borrow()
    }

    /// Run one probe and publish a settled transition, if any.
    pub async fn poll_once(&mut self) -> Option<ConnectivityEvent> {
        let reachable = self.probe.is_reachable().await;
        let event = self.tracker.observe(reachable)?;
        tracing::info!(
            "Connectivity changed: {}",
            if event.online { "online" } else { "offline" }
        );
        self.sender.send_replace(event);
        Some(event)
    }

    /// Poll forever. Dropping the returned future closes the channel.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial probe already ran.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }
}
