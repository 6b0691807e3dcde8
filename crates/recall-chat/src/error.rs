//! Error types for the conversation engine.

use recall_core::error::RecallError;

/// A rejection from the external response service.
///
/// Carries the service's raw message, which is inspected to pick a
/// user-facing fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Classify this rejection.
    pub fn failure(&self) -> ServiceFailure {
        ServiceFailure::classify(&self.message)
    }
}

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("response service error: {0}")]
    Service(#[from] ServiceError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RecallError> for ChatError {
    fn from(err: RecallError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl ChatError {
    /// The failure category used to choose a fallback reply.
    pub fn failure(&self) -> ServiceFailure {
        match self {
            ChatError::Service(e) => e.failure(),
            _ => ServiceFailure::Unknown,
        }
    }

    /// The underlying message without this crate's prefix.
    ///
    /// For service rejections this is exactly what the service reported.
    pub fn raw_message(&self) -> String {
        match self {
            ChatError::Service(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

/// Categories of response-service failure, in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFailure {
    RateLimited,
    QuotaExceeded,
    AuthMisconfigured,
    Transient,
    Unknown,
}

impl ServiceFailure {
    /// Classify an error message by substring. The first matching category
    /// wins; matching is case-insensitive.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["busy", "rate limit"]) {
            ServiceFailure::RateLimited
        } else if has(&["quota", "exceeded"]) {
            ServiceFailure::QuotaExceeded
        } else if has(&["authentication"]) {
            ServiceFailure::AuthMisconfigured
        } else if has(&["technical difficulties"]) {
            ServiceFailure::Transient
        } else {
            ServiceFailure::Unknown
        }
    }

    /// The friendly assistant reply shown in place of a real answer.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            ServiceFailure::RateLimited => {
                "I'm receiving a lot of requests right now. Please wait a moment and try again."
            }
            ServiceFailure::QuotaExceeded => {
                "The AI service has reached its usage limit for now. Please try again later."
            }
            ServiceFailure::AuthMisconfigured => {
                "The AI service isn't configured correctly. Please check the API credentials and try again."
            }
            ServiceFailure::Transient => {
                "I'm experiencing technical difficulties at the moment. Please try again in a few seconds."
            }
            ServiceFailure::Unknown => {
                "Sorry, I encountered an error processing your request. Please try again."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(4000).to_string(),
            "message exceeds maximum length of 4000 characters"
        );
        assert_eq!(
            ChatError::Service(ServiceError::new("boom")).to_string(),
            "response service error: boom"
        );
        assert_eq!(
            ChatError::Storage("disk full".to_string()).to_string(),
            "storage error: disk full"
        );
    }

    #[test]
    fn test_chat_error_from_recall_error() {
        let err: ChatError = RecallError::Storage("connection lost".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("connection lost"));
    }

    #[test]
    fn test_raw_message_strips_prefix_for_service_errors() {
        let err: ChatError = ServiceError::new("rate limit exceeded").into();
        assert_eq!(err.raw_message(), "rate limit exceeded");

        let err = ChatError::MessageTooLong(10);
        assert_eq!(
            err.raw_message(),
            "message exceeds maximum length of 10 characters"
        );
    }

    // ---- Classification ----

    #[test]
    fn test_classify_each_category() {
        assert_eq!(
            ServiceFailure::classify("Service is busy"),
            ServiceFailure::RateLimited
        );
        assert_eq!(
            ServiceFailure::classify("rate limit hit"),
            ServiceFailure::RateLimited
        );
        assert_eq!(
            ServiceFailure::classify("monthly quota reached"),
            ServiceFailure::QuotaExceeded
        );
        assert_eq!(
            ServiceFailure::classify("token budget exceeded"),
            ServiceFailure::QuotaExceeded
        );
        assert_eq!(
            ServiceFailure::classify("Authentication failed"),
            ServiceFailure::AuthMisconfigured
        );
        assert_eq!(
            ServiceFailure::classify("we are having technical difficulties"),
            ServiceFailure::Transient
        );
        assert_eq!(
            ServiceFailure::classify("socket hang up"),
            ServiceFailure::Unknown
        );
    }

    #[test]
    fn test_classify_first_match_wins() {
        // Contains both "rate limit" and "exceeded"; rate limiting is checked first.
        assert_eq!(
            ServiceFailure::classify("rate limit exceeded"),
            ServiceFailure::RateLimited
        );
        assert_eq!(
            ServiceFailure::classify("quota exceeded during authentication"),
            ServiceFailure::QuotaExceeded
        );
    }

    #[test]
    fn test_non_service_errors_are_unknown() {
        assert_eq!(ChatError::EmptyMessage.failure(), ServiceFailure::Unknown);
        assert_eq!(
            ChatError::Storage("x".to_string()).failure(),
            ServiceFailure::Unknown
        );
    }

    #[test]
    fn test_fallback_messages_are_distinct() {
        let all = [
            ServiceFailure::RateLimited,
            ServiceFailure::QuotaExceeded,
            ServiceFailure::AuthMisconfigured,
            ServiceFailure::Transient,
            ServiceFailure::Unknown,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(!a.fallback_message().is_empty());
            for b in &all[i + 1..] {
                assert_ne!(a.fallback_message(), b.fallback_message());
            }
        }
    }
}
