use std::sync::Arc;

use crate::request_context::RequestDispatchContext;
use crate::token::TokenCache;

mod impls;
mod supplier;

pub(crate) use supplier::AccessTokenSupplier;

/// Client for the mini-program backend API.
///
/// Cloning is cheap; clones share the transport and the access-token cache. The
/// background token refresh stops once the last clone is dropped or [`ApiClient::close`]
/// is called.
#[derive(Clone)]
pub struct ApiClient {
    app_id: String,
    secret: String,
    context: RequestDispatchContext,
    tokens: Arc<TokenCache<AccessTokenSupplier>>,
}
