//! Error classification for callers that own a retry policy.
//!
//! The consumer core never retries on its own; it classifies every error it
//! surfaces so the poll loop driving it can decide whether another attempt
//! is worthwhile.

/// Specifies which errors are retryable.
/// All errors are not retryable by-default.
pub trait RetryableError: std::error::Error {
    fn is_retryable(&self) -> bool;
}

/// Shorthand for [`RetryableError::is_retryable`] that brings the trait
/// into scope at the call site.
#[macro_export]
macro_rules! retryable {
    ($error: ident) => {{
        #[allow(unused)]
        use $crate::retry::RetryableError;
        $error.is_retryable()
    }};
    ($error: expr) => {{
        use $crate::retry::RetryableError;
        $error.is_retryable()
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum SomeError {
        #[error("this is a retryable error")]
        ARetryableError,
        #[error("dont retry")]
        DontRetryThis,
    }

    impl RetryableError for SomeError {
        fn is_retryable(&self) -> bool {
            matches!(self, Self::ARetryableError)
        }
    }

    #[test]
    fn classifies_variants() {
        assert!(SomeError::ARetryableError.is_retryable());
        assert!(!SomeError::DontRetryThis.is_retryable());
    }

    #[test]
    fn macro_works_with_idents_and_exprs() {
        let err = SomeError::ARetryableError;
        assert!(retryable!(err));
        assert!(!retryable!(SomeError::DontRetryThis));
    }
}
