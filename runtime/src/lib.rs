//! # Mood Todos Runtime
//!
//! Runs a [`Reducer`] against shared state and executes the effects it
//! returns, feeding every action an effect produces back into the reducer.
//!
//! ## Example
//!
//! ```ignore
//! use mood_todos_runtime::Store;
//!
//! let store = Store::new(SyncState::default(), SyncReducer::new(), environment);
//!
//! // Start the initial fetch and wait for the request to come back
//! store.send(SyncAction::Mount).await.wait().await;
//!
//! let loaded = store.state(|s| s.todos.len()).await;
//! ```

use mood_todos_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors from waiting on a [`Store`](crate::Store)
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// The awaited action or effects did not arrive in time
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Handle for waiting on the effects started by one `send`
///
/// Only tracks the effects returned directly by the reducer for that action,
/// up to the moment their result action has been reduced. Effects started by
/// that result action are not tracked; use [`Store::send_and_wait_for`] when a
/// flow spans several round trips.
#[derive(Clone)]
pub struct EffectHandle {
    running: Arc<AtomicUsize>,
    settled: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let running = Arc::new(AtomicUsize::new(0));
        let (notifier, settled) = watch::channel(());

        let handle = Self {
            running: Arc::clone(&running),
            settled,
        };
        (handle, EffectTracking { running, notifier })
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.running.load(Ordering::SeqCst) > 0 {
            if self.settled.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Shared by every effect started from one `send`
#[derive(Clone)]
struct EffectTracking {
    running: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    /// Count a spawned effect; the returned guard uncounts it when dropped,
    /// including when the effect panics.
    fn start(&self) -> RunningEffect {
        self.running.fetch_add(1, Ordering::SeqCst);
        RunningEffect(self.clone())
    }
}

struct RunningEffect(EffectTracking);

impl Drop for RunningEffect {
    fn drop(&mut self) {
        if self.0.running.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.0.notifier.send(());
        }
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{Arc, Duration, Effect, EffectHandle, EffectTracking, Reducer, RwLock, StoreError};
    use tokio::sync::broadcast;

    /// Buffered result actions per observer of [`Store::send_and_wait_for`]
    const ACTION_BUFFER: usize = 16;

    /// The Store - runtime coordinator for a reducer
    ///
    /// Actions are reduced one at a time under the state write lock, so the
    /// reducer always sees a consistent state even when effects complete
    /// concurrently.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        /// Every action produced by an effect is broadcast here after the
        /// reducer has applied it.
        results: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (results, _) = broadcast::channel(ACTION_BUFFER);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                results,
            }
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the state write lock, then starts the returned
        /// effects. Returns as soon as the effects are started; the returned
        /// [`EffectHandle`] waits for them.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> EffectHandle {
            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!(effects = effects.len(), "Reducer completed");
                effects
            };

            let (handle, tracking) = EffectHandle::new();
            for effect in effects {
                self.execute_effect(effect, &tracking);
            }
            handle
        }

        /// Send an action and wait for a matching result action
        ///
        /// Returns the first action produced by an effect that matches
        /// `predicate`. By the time it returns, the reducer has already
        /// applied that action.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before `timeout`
        /// - [`StoreError::ChannelClosed`]: action broadcast closed
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe first so a fast effect cannot slip past
            let mut rx = self.results.subscribe();
            self.send(action).await;
            wait_for_action(&mut rx, predicate, timeout).await
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loaded = store.state(|s| s.todos.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Start an effect under `tracking`
        ///
        /// Effect failures are the effect's business: a future that wants the
        /// reducer to know about a failure returns a failure action.
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let running = tracking.start();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _running = running;
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect produced an action");
                            store.send(action.clone()).await;
                            // Observers see state that already reflects the action
                            let _ = store.results.send(action);
                        }
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
            }
        }
    }

    async fn wait_for_action<A, F>(
        rx: &mut broadcast::Receiver<A>,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        A: Clone,
        F: Fn(&A) -> bool,
    {
        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // A dropped match surfaces as a timeout
                        tracing::warn!(skipped, "Action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                results: self.results.clone(),
            }
        }
    }
}
