//! Unit tests for category error types

#[cfg(test)]
mod tests {
    use crate::categories::error::CategoryError;
    use crate::source::SourceError;
    use std::error::Error;

    #[test]
    fn test_not_found_display() {
        assert_eq!(CategoryError::NotFound(42).to_string(), "Category 42 not found");
    }

    #[test]
    fn test_timeout_display() {
        let error = CategoryError::Timeout { id: 7, waited_ms: 10_000 };
        assert_eq!(error.to_string(), "Timed out after 10000ms waiting for category 7");
    }

    #[test]
    fn test_source_error_chain() {
        let error: CategoryError = SourceError::Unavailable("down".to_string()).into();

        assert!(error.to_string().contains("Source error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_cancelled_debug() {
        let debug = format!("{:?}", CategoryError::Cancelled);
        assert!(debug.contains("Cancelled"));
    }
}
