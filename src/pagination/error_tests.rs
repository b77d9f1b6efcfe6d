//! Unit tests for pagination error types

#[cfg(test)]
mod tests {
    use crate::pagination::error::PaginationError;
    use crate::source::SourceError;
    use std::error::Error;

    #[test]
    fn test_not_started_display() {
        assert_eq!(
            PaginationError::NotStarted.to_string(),
            "No page has been requested yet"
        );
    }

    #[test]
    fn test_source_error_conversion() {
        let error: PaginationError = SourceError::Request("502".to_string()).into();
        assert_eq!(error.to_string(), "Page load failed: Request failed: 502");
    }

    #[test]
    fn test_sequence_error_keeps_chain() {
        let inner: PaginationError = SourceError::Unavailable("down".to_string()).into();
        let error = PaginationError::in_sequence(1, inner);

        assert!(error.to_string().starts_with("Source #1 of the sequence failed"));
        let source = error.source().unwrap();
        assert!(source.to_string().contains("down"));
    }
}
