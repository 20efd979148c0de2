use crate::crypto::CryptoError;
use std::fmt;

/// Wire security failures
///
/// Never surfaced to DNS clients; responses that fail a check become SERVFAIL.
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityError {
    /// Request has no questions
    NoQuestions,
    /// Request exceeds the question limit
    TooManyQuestions { count: usize, max: usize },
    /// Signed option payload could not be decoded
    MalformedOption(String),
    /// Signed option timestamp outside the replay window
    Expired { age_ms: i64 },
    /// Signature does not verify against the payload
    BadSignature,
    /// A signed option was present but no keys are configured
    MissingKeys,
    /// Response carries no signed option
    Unsigned,
    /// Response does not answer the request it claims to
    PoisoningDetected(String),
    /// Key file unreadable or malformed
    KeyFile(String),
    /// Failure in the underlying primitive
    Crypto(CryptoError),
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoQuestions => write!(f, "Request contains no questions"),
            Self::TooManyQuestions { count, max } => {
                write!(f, "Request has {} questions (limit {})", count, max)
            }
            Self::MalformedOption(msg) => write!(f, "Malformed signed option: {}", msg),
            Self::Expired { age_ms } => {
                write!(f, "Signed option outside replay window ({} ms old)", age_ms)
            }
            Self::BadSignature => write!(f, "Signature verification failed"),
            Self::MissingKeys => write!(f, "No keys configured to verify signed option"),
            Self::Unsigned => write!(f, "Response is not signed"),
            Self::PoisoningDetected(msg) => write!(f, "Possible cache poisoning: {}", msg),
            Self::KeyFile(msg) => write!(f, "Key file error: {}", msg),
            Self::Crypto(e) => write!(f, "Crypto error: {}", e),
        }
    }
}

impl std::error::Error for SecurityError {}

impl From<CryptoError> for SecurityError {
    fn from(e: CryptoError) -> Self {
        Self::Crypto(e)
    }
}

impl From<serde_json::Error> for SecurityError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedOption(e.to_string())
    }
}

impl SecurityError {
    /// True for failures that make an inbound request invalid
    pub fn is_validation_failure(&self) -> bool {
        !matches!(
            self,
            Self::PoisoningDetected(_) | Self::KeyFile(_) | Self::Crypto(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SecurityError>;
