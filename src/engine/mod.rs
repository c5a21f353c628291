//! Presentation engine - the single thread that owns all visual-node mutation
//!
//! The engine is started lazily by the first caller that needs it. Startup
//! spawns a dedicated thread, which runs an optional bootstrap hook before it
//! starts draining its work queue. The starting caller then checks the queue
//! with a no-op task under a bounded [`RetryPolicy`] until the task runs.
//! Concurrent callers block until that outcome is known.
//!
//! One instance is meant to exist per process ([`PresentationEngine::global`]);
//! isolated instances can be built for tests.

pub mod dispatcher;
pub mod retry;

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::domain::{Result, UiError};
use crate::shared::{EngineSettings, PanelConfig};

pub use dispatcher::Dispatcher;
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};

/// Unit of work executed on the engine thread
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// One-time initialisation run on the engine thread before it accepts work
pub type Bootstrap = Box<dyn FnOnce() + Send + 'static>;

thread_local! {
    static ENGINE_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// True when called from any presentation engine thread
pub fn on_engine_thread() -> bool {
    ENGINE_THREAD.with(Cell::get)
}

/// Lifecycle of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Starting,
    Running,
    /// Startup exhausted its retry budget; terminal
    Failed,
}

/// Why a readiness check did not complete
#[derive(Debug)]
enum ReadyError {
    NotReady,
}

/// The single-threaded event loop every visual mutation goes through
pub struct PresentationEngine {
    thread_name: String,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    bootstrap: Mutex<Option<Bootstrap>>,
    state: Mutex<EngineState>,
    state_changed: Condvar,
    sender: OnceLock<Sender<Job>>,
    thread_id: OnceLock<ThreadId>,
    ready: Arc<AtomicBool>,
    spawn_count: AtomicUsize,
}

static GLOBAL: OnceLock<Arc<PresentationEngine>> = OnceLock::new();

impl PresentationEngine {
    /// Create an isolated engine with the given settings. Nothing is spawned
    /// until the first call to [`ensure_started`](Self::ensure_started).
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            thread_name: settings.thread_name.clone(),
            policy: settings.retry_policy(),
            sleeper: retry::default_sleeper(),
            bootstrap: Mutex::new(None),
            state: Mutex::new(EngineState::Uninitialized),
            state_changed: Condvar::new(),
            sender: OnceLock::new(),
            thread_id: OnceLock::new(),
            ready: Arc::new(AtomicBool::new(false)),
            spawn_count: AtomicUsize::new(0),
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the sleeper used between readiness checks
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run `bootstrap` on the engine thread before it accepts any work
    pub fn with_bootstrap(self, bootstrap: impl FnOnce() + Send + 'static) -> Self {
        *self.bootstrap.lock() = Some(Box::new(bootstrap));
        self
    }

    /// The process-wide engine, built from `PanelConfig::load()` on first use
    pub fn global() -> Arc<PresentationEngine> {
        GLOBAL
            .get_or_init(|| Arc::new(Self::new(&PanelConfig::load().engine)))
            .clone()
    }

    /// Install `engine` as the process-wide instance. Returns it back if one
    /// was already installed.
    pub fn install_global(
        engine: Arc<PresentationEngine>,
    ) -> std::result::Result<(), Arc<PresentationEngine>> {
        GLOBAL.set(engine)
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Number of engine threads this instance has spawned (0 or 1)
    pub fn spawn_count(&self) -> usize {
        self.spawn_count.load(Ordering::SeqCst)
    }

    /// True when called from this engine's thread
    pub fn is_engine_thread(&self) -> bool {
        self.thread_id.get() == Some(&thread::current().id())
    }

    /// Start the engine if needed and wait until it is running.
    ///
    /// Safe to call from any number of threads at once: exactly one caller
    /// spawns the engine thread and drives the readiness checks, the rest
    /// wait for the outcome.
    pub fn ensure_started(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            loop {
                match *state {
                    EngineState::Running => return Ok(()),
                    EngineState::Failed => {
                        return Err(UiError::StartupExhausted {
                            attempts: self.policy.max_attempts(),
                        })
                    }
                    EngineState::Starting => self.state_changed.wait(&mut state),
                    EngineState::Uninitialized => {
                        *state = EngineState::Starting;
                        break;
                    }
                }
            }
        }

        let mut guard = StartupGuard {
            engine: self,
            settled: EngineState::Failed,
        };
        let outcome = self.spawn().and_then(|()| self.await_ready());
        if outcome.is_ok() {
            guard.settled = EngineState::Running;
        }
        drop(guard);
        outcome
    }

    fn spawn(&self) -> Result<()> {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let ready = Arc::clone(&self.ready);
        let bootstrap = self.bootstrap.lock().take();

        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || run_loop(rx, ready, bootstrap))
            .map_err(|e| {
                tracing::error!("failed to spawn engine thread: {}", e);
                UiError::EngineSpawn(e.to_string())
            })?;

        let _ = self.thread_id.set(handle.thread().id());
        let _ = self.sender.set(tx);
        self.spawn_count.fetch_add(1, Ordering::SeqCst);
        tracing::info!("spawned engine thread '{}'", self.thread_name);
        Ok(())
    }

    fn await_ready(&self) -> Result<()> {
        let max = self.policy.max_attempts();

        for attempt in 1..=max {
            self.sleeper.sleep(self.policy.backoff(attempt));

            match self.check_ready() {
                Ok(()) => {
                    tracing::info!("engine running after {} attempt(s)", attempt);
                    return Ok(());
                }
                Err(ReadyError::NotReady) => {
                    log!("engine not ready (attempt {}/{})", attempt, max);
                }
            }
        }

        tracing::error!("engine failed to start after {} attempts", max);
        Err(UiError::StartupExhausted { attempts: max })
    }

    /// Post a no-op and wait for it to run
    fn check_ready(&self) -> std::result::Result<(), ReadyError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(ReadyError::NotReady);
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        self.submit(Box::new(move || {
            let _ = done_tx.send(());
        }))
        .map_err(|_| ReadyError::NotReady)?;

        done_rx.recv().map_err(|_| ReadyError::NotReady)
    }

    /// Enqueue a job. The engine must have been spawned.
    pub(crate) fn submit(&self, job: Job) -> Result<()> {
        let sender = self.sender.get().ok_or(UiError::EngineStopped)?;
        sender.send(job).map_err(|_| UiError::EngineStopped)
    }
}

/// Publishes the startup outcome to waiters, even if the starting caller
/// unwinds; anything short of success settles as `Failed`.
struct StartupGuard<'a> {
    engine: &'a PresentationEngine,
    settled: EngineState,
}

impl Drop for StartupGuard<'_> {
    fn drop(&mut self) {
        *self.engine.state.lock() = self.settled;
        self.engine.state_changed.notify_all();
    }
}

fn run_loop(rx: Receiver<Job>, ready: Arc<AtomicBool>, bootstrap: Option<Bootstrap>) {
    ENGINE_THREAD.with(|flag| flag.set(true));

    if let Some(bootstrap) = bootstrap {
        if panic::catch_unwind(AssertUnwindSafe(bootstrap)).is_err() {
            tracing::error!("engine bootstrap panicked; engine will never become ready");
            return;
        }
    }

    ready.store(true, Ordering::Release);

    // Jobs catch their own panics, so one failing job never ends the loop
    for job in rx.iter() {
        job();
    }

    log!("engine queue closed, thread exiting");
}
