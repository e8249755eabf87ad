use std::sync::{Arc, mpsc};
use std::thread;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::environment::{feed::EnvironmentalFeed, snapshot::EnvironmentalSnapshot};

pub const DEFAULT_CHANGE_THRESHOLD: f64 = 0.10;

/// True when `new` differs materially from `old`: a traffic or weather
/// factor present in both snapshots moved by more than `threshold`
/// (relative), or the closure sets differ at all.
pub fn detect_significant_change(
    old: &EnvironmentalSnapshot,
    new: &EnvironmentalSnapshot,
    threshold: f64,
) -> bool {
    if old.closures() != new.closures() {
        return true;
    }

    let traffic_changed = old.traffic().iter().any(|(edge, old_factor)| {
        new.traffic()
            .get(edge)
            .is_some_and(|new_factor| relative_change(*old_factor, *new_factor) > threshold)
    });
    if traffic_changed {
        return true;
    }

    old.weather().iter().any(|(point, old_factor)| {
        new.weather()
            .get(point)
            .is_some_and(|new_factor| relative_change(*old_factor, *new_factor) > threshold)
    })
}

fn relative_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        if new == 0.0 { 0.0 } else { f64::MAX }
    } else {
        ((new - old) / old).abs()
    }
}

/// Handle to the currently published snapshot.
///
/// Single writer (the monitor), any number of readers. Publishing swaps the
/// inner `Arc`, so an in-flight evaluation keeps the snapshot it already
/// cloned and never observes a half-updated one.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Arc<EnvironmentalSnapshot>>>,
}

impl SnapshotStore {
    pub fn new(initial: EnvironmentalSnapshot) -> Self {
        SnapshotStore {
            inner: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    pub fn latest(&self) -> Arc<EnvironmentalSnapshot> {
        Arc::clone(&self.inner.read())
    }

    pub fn publish(&self, snapshot: Arc<EnvironmentalSnapshot>) {
        *self.inner.write() = snapshot;
    }
}

/// Watches the environmental feed and republishes the snapshot when
/// conditions change materially.
///
/// Fetches run on a dedicated worker thread: `poll` queues a fetch and only
/// drains results that have already completed, so a slow or failing feed
/// never stalls a search iteration. While a fetch is in flight (or after a
/// failure) the previously published snapshot stays current.
pub struct RealTimeMonitor {
    feed: Arc<dyn EnvironmentalFeed>,
    store: SnapshotStore,
    threshold: f64,
    fetch_requests: Option<mpsc::Sender<()>>,
    fetched: mpsc::Receiver<EnvironmentalSnapshot>,
    worker: Option<thread::JoinHandle<()>>,
}

impl RealTimeMonitor {
    pub fn new(feed: Arc<dyn EnvironmentalFeed>, store: SnapshotStore, threshold: f64) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<()>();
        let (fetched_tx, fetched_rx) = mpsc::channel();

        let worker_feed = Arc::clone(&feed);
        let worker = thread::Builder::new()
            .name("environment-fetch".to_owned())
            .spawn(move || {
                while request_rx.recv().is_ok() {
                    // Collapse any backlog so a slow feed is hit once, not
                    // once per queued request.
                    while request_rx.try_recv().is_ok() {}

                    match worker_feed.fetch_snapshot() {
                        Ok(snapshot) => {
                            if fetched_tx.send(snapshot).is_err() {
                                break;
                            }
                        }
                        Err(error) => warn!("environmental fetch failed: {error:#}"),
                    }
                }
            })
            .unwrap();

        RealTimeMonitor {
            feed,
            store,
            threshold,
            fetch_requests: Some(request_tx),
            fetched: fetched_rx,
            worker: Some(worker),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Non-blocking check called from inside a search loop. Queues a fresh
    /// fetch, applies the newest completed one if any, and reports whether
    /// the published snapshot was replaced.
    pub fn poll(&mut self) -> bool {
        if let Some(requests) = &self.fetch_requests {
            let _ = requests.send(());
        }

        let mut freshest = None;
        while let Ok(snapshot) = self.fetched.try_recv() {
            freshest = Some(snapshot);
        }

        match freshest {
            Some(snapshot) => self.apply(snapshot),
            None => false,
        }
    }

    /// Blocking fetch-compare-publish for callers outside a search loop.
    pub fn check_now(&mut self) -> Result<bool, anyhow::Error> {
        let snapshot = self.feed.fetch_snapshot()?;
        Ok(self.apply(snapshot))
    }

    fn apply(&mut self, fresh: EnvironmentalSnapshot) -> bool {
        let current = self.store.latest();
        if detect_significant_change(&current, &fresh, self.threshold) {
            self.store.publish(Arc::new(fresh));
            debug!("material environmental change, snapshot replaced");
            true
        } else {
            false
        }
    }
}

impl Drop for RealTimeMonitor {
    fn drop(&mut self) {
        // Closing the request channel lets the worker's recv() fail and the
        // thread wind down.
        self.fetch_requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
