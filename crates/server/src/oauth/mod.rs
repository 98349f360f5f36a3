//! Identity federation: OAuth authorization-code exchange.
//!
//! The flow is the same for every provider, parameterized by endpoints and
//! client credentials from configuration:
//!
//! 1. exchange the callback `code` for provider tokens,
//! 2. fetch the provider profile with those tokens,
//! 3. require a verified email,
//! 4. upsert the local user keyed by email,
//! 5. create a session and issue both credentials.
//!
//! Steps 1-2 are the external trust boundary; their failures never leak
//! past a logged redirect to the client's error page.

pub mod exchange;
pub mod provider;

pub use exchange::{ExchangeOutcome, run_exchange};
pub use provider::{ProviderKind, ProviderProfile, ProviderTokens};
