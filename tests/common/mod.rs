#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use jiff::{SignedDuration, Timestamp};
use wechat_miniprogram::{Error, Token, TokenSupplier};

pub fn expiring_in(credential: &str, secs: i64) -> Token {
    let expires_at = Timestamp::now()
        .checked_add(SignedDuration::from_secs(secs))
        .expect("timestamp in range");
    Token::new(credential, expires_at).expect("valid token")
}

/// Lets spawned tasks run after the paused clock was advanced.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Counts supplier invocations and hands out `T1`, `T2`, ... tokens.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn next(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Supplier issuing tokens valid for `ttl_secs`.
pub fn supplier(ttl_secs: i64) -> (Calls, impl TokenSupplier) {
    let calls = Calls::default();
    let counter = calls.clone();
    let supplier = move || {
        let n = counter.next();
        async move { Ok::<_, Error>(expiring_in(&format!("T{n}"), ttl_secs)) }
    };
    (calls, supplier)
}

/// Supplier that always hands out clones of `token`.
pub fn fixed_supplier(token: Token) -> (Calls, impl TokenSupplier) {
    let calls = Calls::default();
    let counter = calls.clone();
    let supplier = move || {
        counter.next();
        let token = token.clone();
        async move { Ok::<_, Error>(token) }
    };
    (calls, supplier)
}

/// Supplier that waits `latency` before answering, to widen race windows.
pub fn slow_supplier(ttl_secs: i64, latency: Duration) -> (Calls, impl TokenSupplier) {
    let calls = Calls::default();
    let counter = calls.clone();
    let supplier = move || {
        let n = counter.next();
        async move {
            tokio::time::sleep(latency).await;
            Ok::<_, Error>(expiring_in(&format!("T{n}"), ttl_secs))
        }
    };
    (calls, supplier)
}

/// Supplier whose first `failures` calls fail, then behaves like [`supplier`].
pub fn flaky_supplier(ttl_secs: i64, failures: usize) -> (Calls, impl TokenSupplier) {
    let calls = Calls::default();
    let counter = calls.clone();
    let supplier = move || {
        let n = counter.next();
        async move {
            if n <= failures {
                Err(Error::Api {
                    operation: wechat_miniprogram::OperationKind::GetAccessToken,
                    code: 40013,
                    message: "invalid appid".into(),
                })
            } else {
                Ok::<_, Error>(expiring_in(&format!("T{n}"), ttl_secs))
            }
        }
    };
    (calls, supplier)
}

/// Supplier whose calls after the first wait for `gate` to be notified.
pub fn gated_supplier(ttl_secs: i64) -> (Calls, Arc<Notify>, impl TokenSupplier) {
    let calls = Calls::default();
    let gate = Arc::new(Notify::new());
    let counter = calls.clone();
    let held = gate.clone();
    let supplier = move || {
        let n = counter.next();
        let held = held.clone();
        async move {
            if n > 1 {
                held.notified().await;
            }
            Ok::<_, Error>(expiring_in(&format!("T{n}"), ttl_secs))
        }
    };
    (calls, gate, supplier)
}
