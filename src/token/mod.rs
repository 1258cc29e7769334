mod access_token;
mod cache;
mod policy;
mod supplier;

pub use access_token::Token;
pub use cache::TokenCache;
pub use policy::{DEFAULT_LEAD_TIME, RefreshPolicy};
pub use supplier::TokenSupplier;
