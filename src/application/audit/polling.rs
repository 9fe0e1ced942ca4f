//! Periodic refresh of request timelines.
//!
//! A [`TimelineHub`] owns one poller task per request id. Each poller refetches
//! the event list on a fixed cadence and publishes the classified rows through a
//! `watch` channel. When the last subscriber goes away the poller retires and any
//! fetch still in flight is discarded unseen.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use metrics::{counter, gauge};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::classifier::classify_all;
use super::timeline::TimelineState;
use crate::application::backend::{ApprovalsApi, BackendError};
use crate::domain::ListRequestEventsResponse;

/// Refresh cadence used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Orders fetch completions so an older response never replaces a newer one.
#[derive(Debug, Default)]
pub struct LatestWins {
    issued: u64,
    applied: u64,
}

impl LatestWins {
    /// Allocate the token for a new fetch.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Record a completion; returns false when a newer fetch already landed.
    pub fn accept(&mut self, token: u64) -> bool {
        if token <= self.applied {
            return false;
        }
        self.applied = token;
        true
    }

    pub fn latest_issued(&self) -> u64 {
        self.issued
    }
}

type FetchOutcome = (u64, Result<ListRequestEventsResponse, BackendError>);

struct PollerEntry {
    generation: u64,
    sender: Arc<watch::Sender<TimelineState>>,
    handle: JoinHandle<()>,
}

/// Shared registry of per-request pollers.
#[derive(Clone)]
pub struct TimelineHub {
    api: Arc<dyn ApprovalsApi>,
    interval: Duration,
    pollers: Arc<DashMap<String, PollerEntry>>,
    generations: Arc<AtomicU64>,
}

impl TimelineHub {
    pub fn new(api: Arc<dyn ApprovalsApi>, interval: Duration) -> Self {
        Self {
            api,
            interval,
            pollers: Arc::new(DashMap::new()),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to a request's timeline, starting a poller if none is running.
    pub fn subscribe(&self, request_id: &str) -> watch::Receiver<TimelineState> {
        match self.pollers.entry(request_id.to_string()) {
            Entry::Occupied(entry) => entry.get().sender.subscribe(),
            Entry::Vacant(vacant) => {
                let (sender, receiver) = watch::channel(TimelineState::Loading);
                let sender = Arc::new(sender);
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                let handle = tokio::spawn(run_poller(
                    self.clone(),
                    request_id.to_string(),
                    generation,
                    sender.clone(),
                ));
                vacant.insert(PollerEntry {
                    generation,
                    sender,
                    handle,
                });
                gauge!("approvals_timeline_pollers").increment(1.0);
                debug!(
                    target = "approvals_console::audit::polling",
                    request_id, generation, "started timeline poller"
                );
                receiver
            }
        }
    }

    /// Number of pollers currently registered.
    pub fn active_pollers(&self) -> usize {
        self.pollers.len()
    }

    /// Abort every poller, e.g. during shutdown.
    pub fn shutdown(&self) {
        let ids: Vec<String> = self.pollers.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, entry)) = self.pollers.remove(&id) {
                entry.handle.abort();
                gauge!("approvals_timeline_pollers").decrement(1.0);
            }
        }
    }

    /// Remove the poller entry if nobody subscribed again; returns whether the
    /// poller should stop.
    fn retire(&self, request_id: &str, generation: u64) -> bool {
        let removed = self.pollers.remove_if(request_id, |_, entry| {
            entry.generation == generation && entry.sender.receiver_count() == 0
        });
        if removed.is_some() {
            gauge!("approvals_timeline_pollers").decrement(1.0);
            return true;
        }
        // A different generation owning the key means this poller was replaced.
        !self
            .pollers
            .get(request_id)
            .is_some_and(|entry| entry.generation == generation)
    }
}

async fn run_poller(
    hub: TimelineHub,
    request_id: String,
    generation: u64,
    sender: Arc<watch::Sender<TimelineState>>,
) {
    let mut ticker = tokio::time::interval(hub.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut order = LatestWins::default();
    let mut inflight: FuturesUnordered<BoxFuture<'static, FetchOutcome>> = FuturesUnordered::new();

    loop {
        tokio::select! {
            _ = sender.closed() => {
                if hub.retire(&request_id, generation) {
                    debug!(
                        target = "approvals_console::audit::polling",
                        request_id = %request_id,
                        generation,
                        discarded = inflight.len(),
                        "timeline poller retired"
                    );
                    break;
                }
            }
            _ = ticker.tick() => {
                let token = order.issue();
                let api = hub.api.clone();
                let id = request_id.clone();
                inflight.push(Box::pin(async move {
                    (token, api.list_request_events(&id).await)
                }));
            }
            Some((token, result)) = inflight.next(), if !inflight.is_empty() => {
                apply_outcome(&request_id, &sender, &mut order, token, result);
            }
        }
    }
}

fn apply_outcome(
    request_id: &str,
    sender: &watch::Sender<TimelineState>,
    order: &mut LatestWins,
    token: u64,
    result: Result<ListRequestEventsResponse, BackendError>,
) {
    counter!("approvals_timeline_fetch_total").increment(1);

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            counter!("approvals_timeline_fetch_error_total").increment(1);
            warn!(
                target = "approvals_console::audit::polling",
                request_id,
                token,
                error = %err,
                "timeline refresh failed; keeping previous state"
            );
            return;
        }
    };

    if !order.accept(token) {
        counter!("approvals_timeline_stale_discard_total").increment(1);
        debug!(
            target = "approvals_console::audit::polling",
            request_id,
            token,
            latest = order.latest_issued(),
            "discarding stale timeline response"
        );
        return;
    }

    let next = TimelineState::Ready(classify_all(&response.events));
    sender.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}
