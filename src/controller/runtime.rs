//! Event loop shared by the listing controllers.
//!
//! A controller's state lives inside one tokio task and is only mutated by
//! that task, one action at a time. Operations arrive over an unbounded
//! channel; search requests run in their own tasks and report back over the
//! same channel, tagged with the generation they were issued under. The
//! latest state is published through a `watch` channel after every action.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::debounce::Debouncer;
use crate::error::{Result, StorefrontError};
use crate::filter::FilterState;
use crate::search::{ProductSearch, SearchPage};

/// A search the state machine wants issued
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Monotonic tag; only the latest generation's result is applied
    pub generation: u64,
    pub filters: FilterState,
}

/// How a search request ended
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(SearchPage),
    Failure(String),
}

/// A listing state machine driven by [`Runtime`].
///
/// `reduce` must stay free of I/O: it returns the search it wants issued and
/// the runtime performs it.
pub trait Model: Send + 'static {
    type Action: Send + 'static;
    type Snapshot: Clone + Send + Sync + 'static;

    /// Fetch to issue when the controller starts
    fn start(&mut self) -> Option<FetchRequest>;

    fn reduce(&mut self, action: Self::Action) -> Option<FetchRequest>;

    fn snapshot(&self) -> Self::Snapshot;

    /// Text to feed the search debouncer when `action` is dispatched
    fn debounced_text(action: &Self::Action) -> Option<String>;

    /// Action delivered when the search debouncer settles
    fn search_settled(text: String) -> Self::Action;

    /// Action delivered when a fetch finishes
    fn fetch_completed(request: FetchRequest, outcome: FetchOutcome) -> Self::Action;
}

enum Message<M: Model> {
    Dispatch {
        action: M::Action,
        reply: Option<oneshot::Sender<M::Snapshot>>,
    },
    Shutdown,
}

/// Handle to a running controller task
pub struct Runtime<M: Model> {
    tx: mpsc::UnboundedSender<Message<M>>,
    snapshot: watch::Receiver<M::Snapshot>,
    task: Option<JoinHandle<()>>,
}

impl<M: Model> Runtime<M> {
    /// Start the controller task. Must be called from within a tokio runtime.
    pub fn spawn<S>(mut model: M, search: Arc<S>, search_debounce: Duration) -> Self
    where
        S: ProductSearch + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Message<M>>();

        let initial = model.start();
        let (snapshot_tx, snapshot_rx) = watch::channel(model.snapshot());

        if let Some(request) = initial {
            spawn_fetch(Arc::clone(&search), request, tx.downgrade());
        }

        let task = tokio::spawn(run_event_loop(
            model,
            search,
            search_debounce,
            rx,
            tx.downgrade(),
            snapshot_tx,
        ));

        Self {
            tx,
            snapshot: snapshot_rx,
            task: Some(task),
        }
    }

    /// Apply an action and return the state right after it was reduced
    pub async fn dispatch(&self, action: M::Action) -> Result<M::Snapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Message::Dispatch {
                action,
                reply: Some(reply_tx),
            })
            .map_err(|_| StorefrontError::ControllerClosed)?;
        reply_rx.await.map_err(|_| StorefrontError::ControllerClosed)
    }

    pub fn snapshot(&self) -> M::Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<M::Snapshot> {
        self.snapshot.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&M::Snapshot) -> bool,
    ) -> Result<M::Snapshot> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| StorefrontError::ControllerClosed)?;
        Ok((*snapshot).clone())
    }

    /// Stop the task, cancelling any pending debounce.
    ///
    /// Fetches still in flight run to completion but their results are
    /// dropped.
    pub async fn shutdown(mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<M: Model> Drop for Runtime<M> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_event_loop<M, S>(
    mut model: M,
    search: Arc<S>,
    search_debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Message<M>>,
    self_tx: mpsc::WeakUnboundedSender<Message<M>>,
    snapshot_tx: watch::Sender<M::Snapshot>,
) where
    M: Model,
    S: ProductSearch + ?Sized + 'static,
{
    let mut debouncer: Debouncer<String> = Debouncer::new();
    {
        let tx = self_tx.clone();
        debouncer.register(move |text: String| {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Message::Dispatch {
                    action: M::search_settled(text),
                    reply: None,
                });
            }
        });
    }

    while let Some(message) = rx.recv().await {
        let (action, reply) = match message {
            Message::Dispatch { action, reply } => (action, reply),
            Message::Shutdown => break,
        };

        if let Some(text) = M::debounced_text(&action) {
            debouncer.observe(text, search_debounce);
        }

        let effect = model.reduce(action);
        let snapshot = model.snapshot();
        snapshot_tx.send_replace(snapshot.clone());

        if let Some(request) = effect {
            spawn_fetch(Arc::clone(&search), request, self_tx.clone());
        }

        if let Some(reply) = reply {
            let _ = reply.send(snapshot);
        }
    }

    debouncer.cancel();
    tracing::debug!("controller event loop stopped");
}

fn spawn_fetch<M, S>(
    search: Arc<S>,
    request: FetchRequest,
    tx: mpsc::WeakUnboundedSender<Message<M>>,
) where
    M: Model,
    S: ProductSearch + ?Sized + 'static,
{
    tracing::debug!(
        generation = request.generation,
        page = request.filters.page,
        limit = request.filters.limit,
        "fetching products"
    );

    tokio::spawn(async move {
        let outcome = match search.search(&request.filters).await {
            Ok(page) => FetchOutcome::Success(page),
            Err(e) => {
                tracing::warn!(generation = request.generation, "product search failed: {e}");
                FetchOutcome::Failure(e.to_string())
            }
        };

        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(Message::Dispatch {
                action: M::fetch_completed(request, outcome),
                reply: None,
            });
        }
    });
}
