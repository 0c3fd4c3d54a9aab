//! Queue flushing and catalog refresh.
//!
//! [`SyncEngine`] drains pending writes to a [`CatalogRemote`] in creation
//! order, records the outcome of every attempt in the local store, and keeps
//! an in-memory copy of the latest fetched catalog. Network failures never
//! escape the engine: they are logged, recorded on the row, and the write
//! stays pending. Storage failures propagate to the caller.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::config::ShelfConfig;
use crate::connectivity::ConnectivityEvent;
use crate::models::{CatalogItem, PendingWrite, PendingWriteId, ProductPayload, WriteStatus};
use crate::reconcile::CatalogView;
use crate::remote::{CatalogRemote, FetchError, SubmitError};
use crate::services::CatalogStore;
use crate::state::SyncState;
use crate::Result;

const EVENT_CAPACITY: usize = 64;

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Prune uploaded rows older than this after every flush
    pub retention: Option<Duration>,
    /// Fetch the catalog after a flush that uploaded anything
    pub refresh_after_upload: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            retention: None,
            refresh_after_upload: true,
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &ShelfConfig) -> Self {
        Self {
            retention: config.retention(),
            ..Self::default()
        }
    }
}

/// A write that was attempted and not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedWrite {
    pub id: PendingWriteId,
    pub error: SubmitError,
}

/// Outcome of one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub uploaded: Vec<PendingWriteId>,
    pub failed: Vec<FailedWrite>,
    /// Claimed by an overlapping flush, or no longer pending when reached
    pub skipped: Vec<PendingWriteId>,
    pub pruned: usize,
}

impl FlushReport {
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether any failed write may succeed on a later flush.
    pub fn has_retryable_failures(&self) -> bool {
        self.failed.iter().any(|failed| failed.error.is_retryable())
    }
}

/// Notifications published while the engine works.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    FlushStarted,
    WriteUploaded(PendingWriteId),
    WriteFailed {
        id: PendingWriteId,
        error: SubmitError,
    },
    WriteSkipped(PendingWriteId),
    FlushFinished(FlushReport),
    CatalogRefreshed {
        items: usize,
    },
    CatalogRefreshFailed(FetchError),
    ConnectivityChanged {
        online: bool,
    },
}

/// Result of [`SyncEngine::add_product`].
#[derive(Debug, Clone)]
pub struct ProductSubmission {
    /// Stored state of the write after the immediate flush (if any)
    pub write: PendingWrite,
    /// Report of the immediate flush; `None` when offline
    pub report: Option<FlushReport>,
}

impl ProductSubmission {
    /// Whether the server has accepted the product.
    pub fn is_accepted(&self) -> bool {
        self.write.status == WriteStatus::Uploaded
    }

    /// Failure recorded for this write by the immediate flush.
    pub fn failure(&self) -> Option<&SubmitError> {
        self.report.as_ref().and_then(|report| {
            report
                .failed
                .iter()
                .find(|failed| failed.id == self.write.id)
                .map(|failed| &failed.error)
        })
    }
}

/// Removes the id from the in-flight set when dropped.
struct InFlightClaim<'a> {
    in_flight: &'a Mutex<HashSet<PendingWriteId>>,
    id: PendingWriteId,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

pub struct SyncEngine<R> {
    store: CatalogStore,
    remote: R,
    options: SyncOptions,
    in_flight: Mutex<HashSet<PendingWriteId>>,
    online: AtomicBool,
    catalog: RwLock<Vec<CatalogItem>>,
    events: broadcast::Sender<SyncEvent>,
    state: watch::Sender<SyncState>,
}

impl<R: CatalogRemote> SyncEngine<R> {
    /// Create an engine. It starts out offline until told otherwise.
    pub fn new(store: CatalogStore, remote: R, options: SyncOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state, _) = watch::channel(SyncState::Offline);
        Self {
            store,
            remote,
            options,
            in_flight: Mutex::new(HashSet::new()),
            online: AtomicBool::new(false),
            catalog: RwLock::new(Vec::new()),
            events,
            state,
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if !online {
            self.set_state(SyncState::Offline);
        }
        if previous != online {
            self.emit(SyncEvent::ConnectivityChanged { online });
        }
    }

    /// Latest fetched catalog (empty until the first successful refresh).
    pub fn catalog(&self) -> Vec<CatalogItem> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge the cached catalog with favorites and queued writes.
    pub async fn catalog_view(&self) -> Result<CatalogView> {
        let favorites = self.store.list_favorites().await?;
        let pending = self.store.list_pending().await?;
        Ok(CatalogView::build(&self.catalog(), &favorites, &pending))
    }

    /// Queue a product and, when online, try to upload it right away.
    ///
    /// The product counts as added only once the server accepted it; see
    /// [`ProductSubmission::is_accepted`]. A rejected or unreachable upload
    /// leaves the write pending for the next flush.
    pub async fn add_product(&self, payload: ProductPayload) -> Result<ProductSubmission> {
        payload.validate()?;
        let queued = self.store.enqueue_pending_write(&payload).await?;
        tracing::info!("Queued product '{}' as {}", queued.payload.name, queued.id);

        if !self.is_online() {
            tracing::debug!("Offline; {} will upload on reconnect", queued.id);
            return Ok(ProductSubmission {
                write: queued,
                report: None,
            });
        }

        let report = self.flush().await?;
        let write = self
            .store
            .get_pending_write(&queued.id)
            .await?
            .unwrap_or(queued);
        Ok(ProductSubmission {
            write,
            report: Some(report),
        })
    }

    /// Submit every pending write once, oldest first.
    pub async fn flush(&self) -> Result<FlushReport> {
        self.set_state(SyncState::Syncing);
        self.emit(SyncEvent::FlushStarted);

        let report = match self.drain().await {
            Ok(report) => report,
            Err(error) => {
                tracing::error!("Flush aborted by storage failure: {error}");
                self.set_state(SyncState::Error);
                return Err(error);
            }
        };

        tracing::info!(
            "Flush finished: {} uploaded, {} failed, {} skipped",
            report.uploaded.len(),
            report.failed.len(),
            report.skipped.len()
        );

        if !report.uploaded.is_empty() && self.options.refresh_after_upload {
            // Failure is logged and published by refresh_catalog.
            let _ = self.refresh_catalog().await;
        }

        self.set_state(if report.is_clean() {
            SyncState::Synced
        } else {
            SyncState::Error
        });
        self.emit(SyncEvent::FlushFinished(report.clone()));
        Ok(report)
    }

    async fn drain(&self) -> Result<FlushReport> {
        let mut report = FlushReport::default();

        for write in self.store.list_pending().await? {
            let Some(_claim) = self.claim(write.id) else {
                tracing::debug!("{} is already in flight", write.id);
                self.skip(&mut report, write.id);
                continue;
            };

            // An overlapping flush may have finished this write after our listing.
            let current = self.store.get_pending_write(&write.id).await?;
            let Some(current) = current.filter(PendingWrite::is_pending) else {
                self.skip(&mut report, write.id);
                continue;
            };

            match self.remote.submit(&current.payload).await {
                Ok(()) => {
                    self.store.mark_uploaded(&current.id).await?;
                    tracing::info!("Uploaded '{}' ({})", current.payload.name, current.id);
                    report.uploaded.push(current.id);
                    self.emit(SyncEvent::WriteUploaded(current.id));
                }
                Err(error) => {
                    if error.is_retryable() {
                        tracing::warn!("Upload of {} failed, will retry: {error}", current.id);
                    } else {
                        tracing::error!("Upload of {} rejected: {error}", current.id);
                    }
                    self.store
                        .record_failure(&current.id, &error.to_string())
                        .await?;
                    self.emit(SyncEvent::WriteFailed {
                        id: current.id,
                        error: error.clone(),
                    });
                    report.failed.push(FailedWrite {
                        id: current.id,
                        error,
                    });
                }
            }
        }

        if let Some(retention) = self.options.retention {
            report.pruned = self.store.prune_uploaded(retention).await?;
            if report.pruned > 0 {
                tracing::debug!("Pruned {} uploaded writes", report.pruned);
            }
        }

        Ok(report)
    }

    /// Fetch the authoritative catalog and cache it.
    pub async fn refresh_catalog(&self) -> std::result::Result<Vec<CatalogItem>, FetchError> {
        match self.remote.fetch().await {
            Ok(items) => {
                tracing::info!("Fetched {} catalog items", items.len());
                *self
                    .catalog
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = items.clone();
                self.emit(SyncEvent::CatalogRefreshed { items: items.len() });
                Ok(items)
            }
            Err(error) => {
                tracing::warn!("Catalog refresh failed: {error}");
                self.emit(SyncEvent::CatalogRefreshFailed(error.clone()));
                Err(error)
            }
        }
    }

    /// Follow connectivity until the channel closes.
    ///
    /// Flushes once on start when already online, then on every
    /// offline to online transition.
    pub async fn run(&self, mut connectivity: watch::Receiver<ConnectivityEvent>) {
        // False until the current online period has had a flush with no
        // retryable failure. A link that drops and returns mid-flush leaves
        // it false, so the reconnect observed afterwards flushes again.
        let mut synced = false;
        loop {
            let online = connectivity.borrow_and_update().online;
            self.set_online(online);

            if !online {
                synced = false;
            } else if !synced {
                synced = match self.flush().await {
                    Ok(report) => !report.has_retryable_failures(),
                    Err(error) => {
                        tracing::error!("Flush after reconnect failed: {error}");
                        false
                    }
                };
            }

            if connectivity.changed().await.is_err() {
                tracing::debug!("Connectivity channel closed; sync loop exiting");
                break;
            }
        }
    }

    fn claim(&self, id: PendingWriteId) -> Option<InFlightClaim<'_>> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then_some(InFlightClaim {
            in_flight: &self.in_flight,
            id,
        })
    }

    fn skip(&self, report: &mut FlushReport, id: PendingWriteId) {
        report.skipped.push(id);
        self.emit(SyncEvent::WriteSkipped(id));
    }

    fn set_state(&self, state: SyncState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeState {
        failures: HashMap<String, SubmitError>,
        failures_once: HashMap<String, SubmitError>,
        submitted: Vec<String>,
        accepted: Vec<CatalogItem>,
        catalog: Vec<CatalogItem>,
        fetch_error: Option<FetchError>,
        delay: Option<Duration>,
    }

    #[derive(Clone, Default)]
    struct FakeRemote {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeRemote {
        fn fail(&self, name: &str, error: SubmitError) {
            self.state
                .lock()
                .unwrap()
                .failures
                .insert(name.to_string(), error);
        }

        fn fail_once(&self, name: &str, error: SubmitError) {
            self.state
                .lock()
                .unwrap()
                .failures_once
                .insert(name.to_string(), error);
        }

        fn heal(&self, name: &str) {
            self.state.lock().unwrap().failures.remove(name);
        }

        fn with_catalog(self, items: Vec<CatalogItem>) -> Self {
            self.state.lock().unwrap().catalog = items;
            self
        }

        fn with_delay(self, delay: Duration) -> Self {
            self.state.lock().unwrap().delay = Some(delay);
            self
        }

        fn fail_fetch(&self, error: FetchError) {
            self.state.lock().unwrap().fetch_error = Some(error);
        }

        fn submitted(&self) -> Vec<String> {
            self.state.lock().unwrap().submitted.clone()
        }
    }

    impl CatalogRemote for FakeRemote {
        async fn submit(&self, payload: &ProductPayload) -> std::result::Result<(), SubmitError> {
            let delay = {
                let mut state = self.state.lock().unwrap();
                state.submitted.push(payload.name.clone());
                state.delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut state = self.state.lock().unwrap();
            if let Some(error) = state.failures_once.remove(&payload.name) {
                return Err(error);
            }
            if let Some(error) = state.failures.get(&payload.name) {
                return Err(error.clone());
            }
            state.accepted.push(payload.to_catalog_item());
            Ok(())
        }

        async fn fetch(&self) -> std::result::Result<Vec<CatalogItem>, FetchError> {
            let state = self.state.lock().unwrap();
            if let Some(error) = &state.fetch_error {
                return Err(error.clone());
            }
            let mut items = state.catalog.clone();
            items.extend(state.accepted.iter().cloned());
            Ok(items)
        }
    }

    fn payload(name: &str) -> ProductPayload {
        ProductPayload::new(name, "Books", 5.0, 5.0).unwrap()
    }

    fn engine(remote: FakeRemote) -> SyncEngine<FakeRemote> {
        let store = CatalogStore::open_in_memory().unwrap();
        SyncEngine::new(store, remote, SyncOptions::default())
    }

    async fn statuses(engine: &SyncEngine<FakeRemote>) -> Vec<(String, WriteStatus)> {
        engine
            .store()
            .list_writes()
            .await
            .unwrap()
            .into_iter()
            .map(|write| (write.payload.name, write.status))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn flush_continues_past_a_failed_write() {
        let remote = FakeRemote::default();
        remote.fail(
            "Second",
            SubmitError::Server {
                status: 500,
                body: "boom".to_string(),
            },
        );
        let engine = engine(remote.clone());
        for name in ["First", "Second", "Third"] {
            engine.store().enqueue_pending_write(&payload(name)).await.unwrap();
        }

        let report = engine.flush().await.unwrap();

        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.is_retryable());
        assert_eq!(remote.submitted(), vec!["First", "Second", "Third"]);
        assert_eq!(
            statuses(&engine).await,
            vec![
                ("First".to_string(), WriteStatus::Uploaded),
                ("Second".to_string(), WriteStatus::Pending),
                ("Third".to_string(), WriteStatus::Uploaded),
            ]
        );
        assert_eq!(engine.state(), SyncState::Error);

        let failed = engine
            .store()
            .get_pending_write(&report.failed[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.attempt_count, 1);
        assert!(failed.last_error.unwrap().contains("500"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn retry_after_failure_uploads_remaining_write() {
        let remote = FakeRemote::default();
        remote.fail("Pen", SubmitError::Transport("connection refused".to_string()));
        let engine = engine(remote.clone());
        engine.store().enqueue_pending_write(&payload("Pen")).await.unwrap();

        assert_eq!(engine.flush().await.unwrap().failed.len(), 1);
        remote.heal("Pen");
        let report = engine.flush().await.unwrap();

        assert_eq!(report.uploaded.len(), 1);
        assert!(engine.store().list_pending().await.unwrap().is_empty());
        assert_eq!(engine.state(), SyncState::Synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_write_stays_pending_for_inspection() {
        let remote = FakeRemote::default();
        remote.fail(
            "Pen",
            SubmitError::Rejected {
                status: 422,
                message: Some("price must be numeric".to_string()),
            },
        );
        let engine = engine(remote);
        engine.store().enqueue_pending_write(&payload("Pen")).await.unwrap();

        let report = engine.flush().await.unwrap();
        assert!(!report.failed[0].error.is_retryable());

        let pending = engine.store().list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0]
            .last_error
            .as_deref()
            .unwrap()
            .contains("price must be numeric"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overlapping_flushes_submit_each_write_once() {
        let remote = FakeRemote::default().with_delay(Duration::from_millis(25));
        let engine = engine(remote.clone());
        for name in ["A", "B", "C"] {
            engine.store().enqueue_pending_write(&payload(name)).await.unwrap();
        }

        let (first, second) = tokio::join!(engine.flush(), engine.flush());
        let (first, second) = (first.unwrap(), second.unwrap());

        let mut submitted = remote.submitted();
        submitted.sort();
        assert_eq!(submitted, vec!["A", "B", "C"]);
        assert_eq!(first.uploaded.len() + second.uploaded.len(), 3);
        assert_eq!(first.skipped.len() + second.skipped.len(), 3);
        assert!(engine.store().list_pending().await.unwrap().is_empty());
        assert!(engine.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_product_offline_only_queues() {
        let remote = FakeRemote::default();
        let engine = engine(remote.clone());

        let submission = engine.add_product(payload("Notebook")).await.unwrap();

        assert!(!submission.is_accepted());
        assert!(submission.report.is_none());
        assert!(remote.submitted().is_empty());
        assert_eq!(engine.store().list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_product_online_reports_acceptance() {
        let remote = FakeRemote::default();
        let engine = engine(remote);
        engine.set_online(true);

        let submission = engine.add_product(payload("Notebook")).await.unwrap();

        assert!(submission.is_accepted());
        assert!(submission.failure().is_none());
        assert_eq!(engine.catalog().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_product_online_failure_is_not_success() {
        let remote = FakeRemote::default();
        remote.fail("Notebook", SubmitError::Transport("timed out".to_string()));
        let engine = engine(remote);
        engine.set_online(true);

        let submission = engine.add_product(payload("Notebook")).await.unwrap();

        assert!(!submission.is_accepted());
        assert_eq!(
            submission.failure(),
            Some(&SubmitError::Transport("timed out".to_string()))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_product_rejects_invalid_payload_without_queueing() {
        let engine = engine(FakeRemote::default());
        let mut invalid = payload("Pen");
        invalid.price = -1.0;

        assert!(matches!(
            engine.add_product(invalid).await,
            Err(crate::Error::InvalidInput(_))
        ));
        assert!(engine.store().list_writes().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_failure_is_reported_without_failing_flush() {
        let remote = FakeRemote::default();
        remote.fail_fetch(FetchError::Transport("unreachable".to_string()));
        let engine = engine(remote);
        let mut events = engine.subscribe();
        engine.store().enqueue_pending_write(&payload("Pen")).await.unwrap();

        let report = engine.flush().await.unwrap();
        assert_eq!(report.uploaded.len(), 1);
        assert!(engine.catalog().is_empty());

        let mut saw_refresh_failure = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SyncEvent::CatalogRefreshFailed(_)) {
                saw_refresh_failure = true;
            }
        }
        assert!(saw_refresh_failure);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn flush_prunes_uploaded_rows_when_retention_is_set() {
        let store = CatalogStore::open_in_memory().unwrap();
        let options = SyncOptions {
            retention: Some(Duration::ZERO),
            refresh_after_upload: false,
        };
        let engine = SyncEngine::new(store, FakeRemote::default(), options);
        engine.store().enqueue_pending_write(&payload("Pen")).await.unwrap();

        let first = engine.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = engine.flush().await.unwrap();

        assert_eq!(first.pruned + second.pruned, 1);
        assert!(engine.store().list_writes().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconnect_uploads_offline_product_and_reconciles() {
        let remote = FakeRemote::default()
            .with_catalog(vec![CatalogItem::new("Chair", "Home", 50.0, 18.0)]);
        let engine = engine(remote.clone());
        let mut events = engine.subscribe();
        let (connectivity, receiver) = watch::channel(ConnectivityEvent { online: false });

        let submission = engine.add_product(payload("Notebook")).await.unwrap();
        assert_eq!(submission.write.status, WriteStatus::Pending);

        let view = engine.catalog_view().await.unwrap();
        assert_eq!(
            view.entries()[0].source,
            crate::reconcile::ItemSource::LocalPending
        );

        let driver = async {
            connectivity.send_replace(ConnectivityEvent { online: true });
            loop {
                if let SyncEvent::FlushFinished(report) = events.recv().await.unwrap() {
                    drop(connectivity);
                    return report;
                }
            }
        };
        let ((), report) = tokio::join!(engine.run(receiver), driver);

        assert_eq!(report.uploaded, vec![submission.write.id]);
        assert_eq!(remote.submitted(), vec!["Notebook"]);

        let view = engine.catalog_view().await.unwrap();
        let listed: Vec<_> = view
            .entries()
            .iter()
            .map(|entry| (entry.item.name.as_str(), entry.source))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("Chair", crate::reconcile::ItemSource::Remote),
                ("Notebook", crate::reconcile::ItemSource::Remote),
            ]
        );
        assert_eq!(engine.state(), SyncState::Synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn link_drop_during_flush_is_retried_after_reconnect() {
        let remote = FakeRemote::default().with_delay(Duration::from_millis(200));
        remote.fail_once(
            "Notebook",
            SubmitError::Transport("connection reset".to_string()),
        );
        let engine = engine(remote.clone());
        engine
            .store()
            .enqueue_pending_write(&payload("Notebook"))
            .await
            .unwrap();
        let mut events = engine.subscribe();
        let (connectivity, receiver) = watch::channel(ConnectivityEvent { online: true });

        // The link drops and returns while the first submit is still waiting.
        let driver = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            connectivity.send_replace(ConnectivityEvent { online: false });
            tokio::time::sleep(Duration::from_millis(50)).await;
            connectivity.send_replace(ConnectivityEvent { online: true });

            let mut reports = Vec::new();
            while reports.len() < 2 {
                if let SyncEvent::FlushFinished(report) = events.recv().await.unwrap() {
                    reports.push(report);
                }
            }
            drop(connectivity);
            reports
        };
        let ((), reports) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(engine.run(receiver), driver)
        })
        .await
        .expect("second flush never ran");

        assert_eq!(reports[0].failed.len(), 1);
        assert!(reports[0].has_retryable_failures());
        assert_eq!(reports[1].uploaded.len(), 1);
        assert_eq!(remote.submitted(), vec!["Notebook", "Notebook"]);
        assert!(engine.store().list_pending().await.unwrap().is_empty());
        assert_eq!(engine.state(), SyncState::Synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_write_is_not_retried_while_online() {
        let remote = FakeRemote::default();
        remote.fail(
            "Notebook",
            SubmitError::Rejected {
                status: 422,
                message: None,
            },
        );
        let engine = engine(remote.clone());
        engine
            .store()
            .enqueue_pending_write(&payload("Notebook"))
            .await
            .unwrap();
        let mut events = engine.subscribe();
        let (connectivity, receiver) = watch::channel(ConnectivityEvent { online: true });

        let driver = async {
            loop {
                if let SyncEvent::FlushFinished(report) = events.recv().await.unwrap() {
                    // Same value again: no transition, so no second flush.
                    connectivity.send_replace(ConnectivityEvent { online: true });
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    drop(connectivity);
                    return report;
                }
            }
        };
        let ((), report) = tokio::join!(engine.run(receiver), driver);

        assert!(!report.has_retryable_failures());
        assert_eq!(remote.submitted(), vec!["Notebook"]);
    }
}
