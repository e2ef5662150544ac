//! Poll-driven subscription to the live contents of a bucket.
//!
//! [`ListenerClient`] runs a single background task that fetches the
//! bucket on a fixed interval and hands the result to a user
//! [`Listener`]. The lifecycle is a three-state machine on one atomic:
//! stopped (0), running (1), transitioning (2). Transitions happen by
//! compare-and-swap, so under arbitrary concurrent `start`/`stop` calls
//! exactly one caller wins each phase and the rest get
//! [`ListenerError::NotStopped`] / [`ListenerError::NotRunning`]; at most
//! one poll task is ever alive.
//!
//! The user callback runs synchronously on the poll task. A slow callback
//! delays the next tick rather than queueing updates; that back-pressure
//! is deliberate, so no buffering is added. A panicking callback kills
//! the poll task and the panic resurfaces from [`ListenerClient::stop`].

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use argus::model::Item;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::{ClientError, ListenerError};
use crate::measures::{PollMeasures, OUTCOME_FAILURE, OUTCOME_LABEL, OUTCOME_SUCCESS};

/// Interval used when the configuration leaves it unset.
pub const DEFAULT_PULL_INTERVAL: Duration = Duration::from_secs(5);

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;
const TRANSITIONING: u8 = 2;

/// Receives the full current contents of the bucket on every successful
/// poll.
pub trait Listener: Send + Sync {
    /// Called synchronously from the poll task with the fetched items.
    fn update(&self, items: Vec<Item>);
}

/// Adapts a closure into a [`Listener`].
///
/// # Examples
///
/// ```
/// use chrysom::listener::{Listener, ListenerFn};
///
/// let listener = ListenerFn(|items: Vec<argus::model::Item>| {
///     println!("bucket now holds {} items", items.len());
/// });
/// listener.update(Vec::new());
/// ```
pub struct ListenerFn<F>(pub F);

impl<F> Listener for ListenerFn<F>
where
    F: Fn(Vec<Item>) + Send + Sync,
{
    fn update(&self, items: Vec<Item>) {
        (self.0)(items);
    }
}

/// Source the poll task fetches from; implemented by
/// [`BasicClient`](crate::client::BasicClient).
#[async_trait]
pub trait Reader: Send + Sync {
    /// Fetches the items visible to `owner`.
    async fn get_items(&self, owner: &str) -> Result<Vec<Item>, ClientError>;
}

/// Listener wiring: the callback and the pull cadence.
#[derive(Default)]
pub struct ListenerConfig {
    /// The callback to invoke per successful poll.
    pub listener: Option<Arc<dyn Listener>>,
    /// Time between polls; unset means [`DEFAULT_PULL_INTERVAL`].
    pub pull_interval: Option<Duration>,
}

/// Builder for [`ListenerClient`]; rejects incomplete wiring with the
/// specific [`ListenerError`] kinds.
#[derive(Default)]
pub struct ListenerClientBuilder {
    config: ListenerConfig,
    reader: Option<Arc<dyn Reader>>,
    measures: Option<PollMeasures>,
}

impl ListenerClientBuilder {
    /// Applies a full configuration at once.
    pub fn config(mut self, config: ListenerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the callback.
    pub fn listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.config.listener = Some(listener);
        self
    }

    /// Sets the pull cadence.
    pub fn pull_interval(mut self, interval: Duration) -> Self {
        self.config.pull_interval = Some(interval);
        self
    }

    /// Sets the item source.
    pub fn reader(mut self, reader: Arc<dyn Reader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Sets the metrics handle.
    pub fn measures(mut self, measures: PollMeasures) -> Self {
        self.measures = Some(measures);
        self
    }

    /// Validates the wiring and builds the client.
    ///
    /// # Errors
    ///
    /// [`ListenerError::NoListenerProvided`],
    /// [`ListenerError::NoReaderProvided`], or
    /// [`ListenerError::NoMeasuresProvided`] when the corresponding piece
    /// is missing.
    pub fn build(self) -> Result<ListenerClient, ListenerError> {
        if self.config.listener.is_none() {
            return Err(ListenerError::NoListenerProvided);
        }
        let reader = self.reader.ok_or(ListenerError::NoReaderProvided)?;
        let measures = self.measures.ok_or(ListenerError::NoMeasuresProvided)?;
        Ok(ListenerClient {
            listener: self.config.listener,
            reader,
            measures,
            pull_interval: self.config.pull_interval.unwrap_or(DEFAULT_PULL_INTERVAL),
            state: AtomicU8::new(STOPPED),
            shutdown: Mutex::new(None),
            task: Mutex::new(None),
        })
    }
}

/// Periodically fetches the bucket and feeds a [`Listener`].
pub struct ListenerClient {
    listener: Option<Arc<dyn Listener>>,
    reader: Arc<dyn Reader>,
    measures: PollMeasures,
    pull_interval: Duration,
    state: AtomicU8,
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ListenerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerClient")
            .field("pull_interval", &self.pull_interval)
            .field("state", &self.state.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl ListenerClient {
    /// Starts building a client.
    pub fn builder() -> ListenerClientBuilder {
        ListenerClientBuilder::default()
    }

    /// Whether a poll task is currently running.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::SeqCst) == RUNNING
    }

    /// Starts the poll task.
    ///
    /// Must be called from within a tokio runtime. The first poll fires
    /// one full interval after this call returns.
    ///
    /// # Errors
    ///
    /// [`ListenerError::UndefinedIntervalTicker`] when the configured
    /// interval is zero; [`ListenerError::NotStopped`] when the client is
    /// already running or mid-transition.
    pub fn start(&self) -> Result<(), ListenerError> {
        let Some(listener) = self.listener.clone() else {
            tracing::warn!("no listener configured, nothing to start");
            return Ok(());
        };
        if self.pull_interval.is_zero() {
            return Err(ListenerError::UndefinedIntervalTicker);
        }
        self.state
            .compare_exchange(STOPPED, TRANSITIONING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ListenerError::NotStopped)?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let reader = self.reader.clone();
        let measures = self.measures.clone();
        let period = self.pull_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => match reader.get_items("").await {
                        Ok(items) => {
                            listener.update(items);
                            measures.polls.inc(&[(OUTCOME_LABEL, OUTCOME_SUCCESS)]);
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to fetch items");
                            measures.polls.inc(&[(OUTCOME_LABEL, OUTCOME_FAILURE)]);
                        }
                    },
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        *self.shutdown.lock() = Some(shutdown_tx);
        *self.task.lock() = Some(handle);
        self.state.store(RUNNING, Ordering::SeqCst);
        Ok(())
    }

    /// Stops the poll task and waits for it to finish.
    ///
    /// Once this returns, no further `update` call will be made. If the
    /// poll task died to a listener panic, the panic resumes here.
    ///
    /// # Errors
    ///
    /// [`ListenerError::NotRunning`] when the client is stopped or
    /// mid-transition.
    pub async fn stop(&self) -> Result<(), ListenerError> {
        if self.listener.is_none() {
            return Ok(());
        }
        self.state
            .compare_exchange(RUNNING, TRANSITIONING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ListenerError::NotRunning)?;

        let shutdown = self.shutdown.lock().take();
        let task = self.task.lock().take();
        if let Some(shutdown) = shutdown {
            // A send failure means the task already exited; joining below
            // still surfaces its panic, if any.
            let _ = shutdown.send(()).await;
        }
        if let Some(task) = task {
            if let Err(err) = task.await {
                self.state.store(STOPPED, Ordering::SeqCst);
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
                return Ok(());
            }
        }
        self.state.store(STOPPED, Ordering::SeqCst);
        Ok(())
    }
}
