//! DNS wire security
//!
//! Inbound requests are checked for shape and, when they carry one, a signed EDNS
//! option (code 65001). Outbound responses are checked against their request,
//! stamped and signed.

pub mod errors;
pub mod keys;
pub mod option;
pub mod wire;

pub use errors::{Result, SecurityError};
pub use keys::{KeyFile, SecurityKeys};
pub use option::SignedOption;
pub use wire::{
    WireSecurity, answer_payload, check_cache_poisoning, question_payload, server_failure,
};

use std::time::Duration;

/// Maximum age of a signed option, in either direction
pub const DEFAULT_REPLAY_WINDOW: Duration = Duration::from_secs(300);

/// Anti-amplification limit on questions per request
pub const DEFAULT_MAX_QUESTIONS: usize = 5;

/// Owner of the TXT timestamp record added to secured responses
pub const TIMESTAMP_RECORD_NAME: &str = "_timestamp";

pub const TIMESTAMP_TTL: u32 = 30;
