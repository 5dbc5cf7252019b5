//! Supervision of long-running ambient behaviors (scripted playback,
//! periodic conversation starters): scope-keyed, cancellable, at most one
//! live runner per scope.

use core::fmt;
use core::future::Future;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ChannelId;

/// Granularity at which a supervisor tracks its runners.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Channel(ChannelId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Channel(id) => write!(f, "channel {id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// The per-supervisor cooldown since the scope's last completed run has
    /// not elapsed yet.
    TooSoon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Default)]
struct ScopeState {
    /// Present exactly while a runner owns this scope.
    cancel: Option<CancellationToken>,
    generation: u64,
    last_completed: Option<Instant>,
}

#[derive(Debug)]
struct Inner {
    cooldown: Option<Duration>,
    next_generation: AtomicU64,
    scopes: Mutex<HashMap<Scope, ScopeState>>,
}

/// Tracks one runner per scope behind a single lock, so two concurrent
/// `start` calls can never both observe "not running" and launch duplicates.
///
/// `stop` releases the scope immediately after signalling cancellation; the
/// runner keeps executing until it observes the signal, but may no longer
/// send anything, and its completion time is still recorded once on exit.
#[derive(Debug, Clone)]
pub struct AmbientSupervisor {
    inner: Arc<Inner>,
}

impl Default for AmbientSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl AmbientSupervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A supervisor that additionally rejects starts with [`StartOutcome::TooSoon`]
    /// until `cooldown` has passed since the scope's last completed run.
    #[must_use]
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self::build(Some(cooldown))
    }

    fn build(cooldown: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cooldown,
                next_generation: AtomicU64::new(0),
                scopes: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Launch `runner` under a fresh cancellation token, unless the scope is
    /// busy or cooling down. The runner is only constructed on a successful
    /// claim.
    pub async fn start<F, Fut>(&self, scope: Scope, runner: F) -> StartOutcome
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let (token, generation) = {
            let mut scopes = self.inner.scopes.lock().await;
            let state = scopes.entry(scope.clone()).or_default();
            if state.cancel.is_some() {
                return StartOutcome::AlreadyRunning;
            }
            if let (Some(cooldown), Some(done)) = (self.inner.cooldown, state.last_completed)
                && done.elapsed() < cooldown
            {
                return StartOutcome::TooSoon;
            }
            let token = CancellationToken::new();
            let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
            state.cancel = Some(token.clone());
            state.generation = generation;
            (token, generation)
        };

        debug!(scope = %scope, generation, "starting ambient runner");
        let fut = runner(token);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(error) = fut.await {
                warn!(scope = %scope, error = %error, "ambient runner failed");
            }
            Inner::finish(&inner, &scope, generation).await;
        });
        StartOutcome::Started
    }

    /// Signal cancellation and release the scope. Returns without waiting
    /// for the runner to exit.
    pub async fn stop(&self, scope: &Scope) -> StopOutcome {
        let mut scopes = self.inner.scopes.lock().await;
        match scopes.get_mut(scope).and_then(|state| state.cancel.take()) {
            Some(token) => {
                token.cancel();
                StopOutcome::Stopped
            }
            None => StopOutcome::NotRunning,
        }
    }

    /// Signal every live runner; used at shutdown. Returns how many were
    /// signalled.
    pub async fn stop_all(&self) -> usize {
        let mut scopes = self.inner.scopes.lock().await;
        let mut stopped = 0;
        for state in scopes.values_mut() {
            if let Some(token) = state.cancel.take() {
                token.cancel();
                stopped += 1;
            }
        }
        stopped
    }

    pub async fn is_running(&self, scope: &Scope) -> bool {
        let scopes = self.inner.scopes.lock().await;
        scopes.get(scope).is_some_and(|state| state.cancel.is_some())
    }

    /// Time since the scope's most recent run finished, `None` if none ever
    /// completed.
    pub async fn time_since_last_run(&self, scope: &Scope) -> Option<Duration> {
        let scopes = self.inner.scopes.lock().await;
        scopes
            .get(scope)
            .and_then(|state| state.last_completed)
            .map(|done| done.elapsed())
    }
}

impl Inner {
    /// Exit path for every runner, natural or cancelled. Records the
    /// completion time once; the generation check keeps a stale exit from
    /// releasing a scope that a newer runner has since claimed.
    async fn finish(inner: &Arc<Self>, scope: &Scope, generation: u64) {
        let mut scopes = inner.scopes.lock().await;
        if let Some(state) = scopes.get_mut(scope) {
            state.last_completed = Some(Instant::now());
            if state.generation == generation {
                state.cancel = None;
            }
        }
    }
}
