//! Unit tests for source error types

#[cfg(test)]
mod tests {
    use crate::source::error::SourceError;
    use std::error::Error;

    #[test]
    fn test_unavailable_display() {
        let error = SourceError::Unavailable("catalog offline".to_string());
        assert_eq!(error.to_string(), "Source unavailable: catalog offline");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let error = SourceError::InvalidParameter {
            key: "pledged".to_string(),
            value: "between.1".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid parameter 'pledged': between.1");
    }

    #[test]
    fn test_decode_error_from_serde() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: SourceError = json_error.into();

        assert!(error.to_string().contains("Decode error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_io_error_from_std() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "projects.json");
        let error: SourceError = io_error.into();

        assert!(matches!(error, SourceError::Io(_)));
    }

    #[test]
    fn test_request_error_has_no_source() {
        let error = SourceError::Request("timeout".to_string());
        assert!(error.source().is_none());
    }
}
