use std::sync::{Arc, PoisonError, Weak};
use std::time::Duration;

use jiff::Timestamp;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::Error;
use crate::telemetry::refresh::{RefreshTelemetry, RefreshTrigger};

use super::{RefreshPolicy, Token, TokenSupplier};

/// Holds the current access token and keeps it fresh in the background.
///
/// The first [`TokenCache::get_value`] call fetches synchronously; every successful
/// fetch then schedules exactly one follow-up refresh, `lead_time` ahead of expiry.
/// A failed background refresh empties the cache so the next caller fetches again.
/// Dropping the cache cancels the pending refresh.
pub struct TokenCache<S: TokenSupplier> {
    shared: Arc<Shared<S>>,
}

struct Shared<S> {
    current: RwLock<Option<Token>>,
    // Serializes supplier calls; the value lock is only taken for the swap.
    refresh_lock: Mutex<()>,
    supplier: S,
    policy: RefreshPolicy,
    refresher: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<S: TokenSupplier> TokenCache<S> {
    pub fn new(supplier: S, policy: RefreshPolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: RwLock::new(None),
                refresh_lock: Mutex::new(()),
                supplier,
                policy,
                refresher: std::sync::Mutex::new(None),
            }),
        }
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.shared.policy
    }

    /// Returns a valid token, fetching one first if nothing usable is cached.
    pub async fn get_value(&self) -> Result<Token, Error> {
        if let Some(token) = self.shared.read_current().await {
            return Ok(token);
        }

        let _lock = self.shared.refresh_lock.lock().await;
        // Callers that queued behind a cold-start fetch reuse its result.
        if let Some(token) = self.shared.read_current().await {
            return Ok(token);
        }

        let telemetry = RefreshTelemetry::new(RefreshTrigger::ColdStart);
        let (token, next_refresh_in) = self.shared.fetch_and_store(&telemetry).await?;
        self.schedule(next_refresh_in);
        Ok(token)
    }

    /// The stored token, if any, without contacting the supplier.
    pub async fn current(&self) -> Option<Token> {
        self.shared.current.read().await.clone()
    }

    /// Cancels the pending background refresh. The stored token is kept.
    pub fn shutdown(&self) {
        let pending = self
            .shared
            .refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending {
            task.abort();
            debug!("token refresh chain cancelled");
        }
    }

    #[cfg(test)]
    pub(crate) fn refresh_pending(&self) -> bool {
        self.shared
            .refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    // Starts a new refresh chain, replacing any previous one. The deadline is fixed
    // here, at store time, not when the spawned task is first polled.
    fn schedule(&self, delay: Duration) {
        let due = Instant::now() + delay;
        let task = tokio::spawn(refresh_chain(Arc::downgrade(&self.shared), due));
        let previous = self
            .shared
            .refresher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl<S: TokenSupplier> Drop for TokenCache<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: TokenSupplier> Shared<S> {
    async fn read_current(&self) -> Option<Token> {
        let current = self.current.read().await;
        current.as_ref().filter(|token| !token.is_expired()).cloned()
    }

    /// Fetches a token and swaps it in. Callers must hold `refresh_lock`.
    async fn fetch_and_store(
        &self,
        telemetry: &RefreshTelemetry,
    ) -> Result<(Token, Duration), Error> {
        telemetry.emit_start();
        let fetched = match self.supplier.fetch().await {
            Ok(token) => token,
            Err(err) => {
                let err = Error::supplier(err);
                telemetry.emit_failure(&err);
                return Err(err);
            }
        };

        let Some(next_refresh_in) = self.policy.next_refresh_in(&fetched, Timestamp::now()) else {
            let err = Error::supplier(Error::ExpiredToken {
                expires_at: fetched.expires_at(),
            });
            telemetry.emit_failure(&err);
            return Err(err);
        };

        *self.current.write().await = Some(fetched.clone());
        telemetry.emit_success(fetched.expires_at(), next_refresh_in);
        Ok((fetched, next_refresh_in))
    }
}

async fn refresh_chain<S: TokenSupplier>(cache: Weak<Shared<S>>, mut due: Instant) {
    loop {
        debug!(
            delay = ?due.saturating_duration_since(Instant::now()),
            "token refresh scheduled"
        );
        tokio::time::sleep_until(due).await;

        let Some(shared) = cache.upgrade() else {
            debug!("token cache dropped; refresh chain stopped");
            return;
        };
        let _lock = shared.refresh_lock.lock().await;
        let telemetry = RefreshTelemetry::new(RefreshTrigger::Scheduled);
        match shared.fetch_and_store(&telemetry).await {
            Ok((_, next_refresh_in)) => due = Instant::now() + next_refresh_in,
            Err(err) => {
                shared.current.write().await.take();
                warn!(
                    attempt_id = %telemetry.attempt_id(),
                    error = %err,
                    "scheduled token refresh failed; next caller will fetch synchronously"
                );
                return;
            }
        }
    }
}
