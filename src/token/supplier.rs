use std::future::Future;

use crate::errors::Error;

use super::Token;

/// Performs one remote fetch of a fresh access token.
///
/// The cache serializes calls, so implementations need not handle concurrent fetches.
pub trait TokenSupplier: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Token, Error>> + Send;
}

impl<F, Fut> TokenSupplier for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Token, Error>> + Send,
{
    fn fetch(&self) -> impl Future<Output = Result<Token, Error>> + Send {
        self()
    }
}
