//! Dispatcher - run work on the engine thread from any thread
//!
//! `run_now` blocks the caller until the work has run and hands back its
//! result. A panic inside the work is caught on the engine thread and
//! returned to the caller as [`UiError::DispatchedWorkFailure`]; the engine
//! keeps draining its queue.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::domain::{Result, UiError};

use super::PresentationEngine;

/// Cheap, cloneable handle for submitting work to one engine
#[derive(Clone)]
pub struct Dispatcher {
    engine: Arc<PresentationEngine>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.engine.state())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(engine: Arc<PresentationEngine>) -> Self {
        Self { engine }
    }

    /// Dispatcher for the process-wide engine
    pub fn global() -> Self {
        Self::new(PresentationEngine::global())
    }

    pub fn engine(&self) -> &Arc<PresentationEngine> {
        &self.engine
    }

    pub fn is_engine_thread(&self) -> bool {
        self.engine.is_engine_thread()
    }

    /// Run `work` on the engine thread and wait for it to finish.
    ///
    /// Called from the engine thread itself, `work` runs inline so that
    /// callbacks can dispatch without deadlocking.
    pub fn run_now<F, R>(&self, work: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.engine.is_engine_thread() {
            return capture(work);
        }

        self.engine.ensure_started()?;

        let (done_tx, done_rx) = crossbeam_channel::bounded::<Result<R>>(1);
        self.engine.submit(Box::new(move || {
            let _ = done_tx.send(capture(work));
        }))?;

        done_rx.recv().map_err(|_| UiError::EngineStopped)?
    }

    /// Like [`run_now`](Self::run_now) for work that reports its own errors
    pub fn try_run_now<F, T, E>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.run_now(work)?
            .map_err(|e| UiError::DispatchedWorkFailure(e.to_string()))
    }

    /// Queue `work` without waiting for it. Always goes through the queue,
    /// even from the engine thread. Failures are logged.
    pub fn run_later<F>(&self, work: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.engine.is_engine_thread() {
            self.engine.ensure_started()?;
        }

        self.engine.submit(Box::new(move || {
            if let Err(e) = capture(work) {
                tracing::warn!("deferred work failed: {}", e);
            }
        }))
    }
}

fn capture<F, R>(work: F) -> Result<R>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!("dispatched work panicked: {}", message);
        UiError::DispatchedWorkFailure(message)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::EngineSettings;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn dispatcher() -> Dispatcher {
        let settings = EngineSettings {
            backoff_step_ms: 5,
            ..EngineSettings::default()
        };
        Dispatcher::new(Arc::new(PresentationEngine::new(&settings)))
    }

    #[test]
    fn test_run_now_returns_value() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.run_now(|| 6 * 7).unwrap(), 42);
    }

    #[test]
    fn test_run_now_runs_on_engine_thread() {
        let dispatcher = dispatcher();
        let engine = Arc::clone(dispatcher.engine());
        let on_engine = dispatcher.run_now(move || engine.is_engine_thread()).unwrap();
        assert!(on_engine);
        assert!(!dispatcher.is_engine_thread());
    }

    #[test]
    fn test_reentrant_run_now_executes_inline() {
        let dispatcher = dispatcher();
        let inner = dispatcher.clone();
        let order = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&order);

        dispatcher
            .run_now(move || {
                log.lock().push("outer-start");
                let nested = Arc::clone(&log);
                inner
                    .run_now(move || nested.lock().push("inner"))
                    .unwrap();
                log.lock().push("outer-end");
            })
            .unwrap();

        assert_eq!(*order.lock(), vec!["outer-start", "inner", "outer-end"]);
    }

    #[test]
    fn test_panic_is_reported_to_caller() {
        let dispatcher = dispatcher();
        let err = dispatcher
            .run_now(|| -> u32 { panic!("instrument timed out") })
            .unwrap_err();
        assert_eq!(
            err,
            UiError::DispatchedWorkFailure("instrument timed out".to_string())
        );
    }

    #[test]
    fn test_failure_does_not_break_engine() {
        let dispatcher = dispatcher();
        let _ = dispatcher.run_now(|| panic!("boom"));
        assert_eq!(dispatcher.run_now(|| "still alive").unwrap(), "still alive");
    }

    #[test]
    fn test_reentrant_panic_is_captured() {
        let dispatcher = dispatcher();
        let inner = dispatcher.clone();
        let nested = dispatcher
            .run_now(move || inner.run_now(|| panic!("nested")))
            .unwrap();
        assert!(matches!(nested, Err(UiError::DispatchedWorkFailure(_))));
    }

    #[test]
    fn test_try_run_now_wraps_error() {
        let dispatcher = dispatcher();
        let result: Result<u8> = dispatcher.try_run_now(|| "abc".parse::<u8>());
        assert!(matches!(result, Err(UiError::DispatchedWorkFailure(_))));

        let ok: Result<u8> = dispatcher.try_run_now(|| "12".parse::<u8>());
        assert_eq!(ok.unwrap(), 12);
    }

    #[test]
    fn test_run_later_is_ordered_before_run_now() {
        let dispatcher = dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let seen = Arc::clone(&seen);
            dispatcher.run_later(move || seen.lock().push(i)).unwrap();
        }
        let snapshot = Arc::clone(&seen);
        let observed = dispatcher.run_now(move || snapshot.lock().clone()).unwrap();

        assert_eq!(observed, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_cross_thread_submission_order() {
        let dispatcher = dispatcher();
        let counter = Arc::new(AtomicUsize::new(0));

        // W1 is fully accepted (and completed) before W2 is submitted
        let first = {
            let dispatcher = dispatcher.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                dispatcher
                    .run_now(move || counter.fetch_add(1, Ordering::SeqCst))
                    .unwrap()
            })
            .join()
            .unwrap()
        };
        let second = {
            let dispatcher = dispatcher.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                dispatcher
                    .run_now(move || counter.fetch_add(1, Ordering::SeqCst))
                    .unwrap()
            })
            .join()
            .unwrap()
        };

        assert_eq!((first, second), (0, 1));
    }

    #[test]
    fn test_many_producers_never_overlap() {
        let dispatcher = dispatcher();
        let active = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let per_thread = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let dispatcher = dispatcher.clone();
                let active = Arc::clone(&active);
                let overlaps = Arc::clone(&overlaps);
                let per_thread = Arc::clone(&per_thread);
                thread::spawn(move || {
                    for i in 0..50 {
                        let active = Arc::clone(&active);
                        let overlaps = Arc::clone(&overlaps);
                        let per_thread = Arc::clone(&per_thread);
                        dispatcher
                            .run_now(move || {
                                if active.fetch_add(1, Ordering::SeqCst) != 0 {
                                    overlaps.fetch_add(1, Ordering::SeqCst);
                                }
                                per_thread.lock().push((t, i));
                                active.fetch_sub(1, Ordering::SeqCst);
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        let seen = per_thread.lock();
        assert_eq!(seen.len(), 200);
        // Each producer's own items appear in submission order
        for t in 0..4 {
            let mine: Vec<_> = seen.iter().filter(|(p, _)| *p == t).map(|(_, i)| *i).collect();
            assert_eq!(mine, (0..50).collect::<Vec<_>>());
        }
    }
}
