//! Bot-token detection core: pattern matching, segment decoding and the
//! provenance-aware validity policy. Pure and synchronous; safe to call from
//! any number of request handlers at once.

pub mod matcher;
pub mod observer;
pub mod validator;

pub use matcher::{find_candidate, TokenCandidate};
pub use observer::{Rejection, TracingObserver, ValidationObserver};
pub use validator::{validate, TokenValidator, DISCORD_EPOCH, TOKEN_EPOCH};
