use thiserror::Error;

/// Rejections from item store operations. Neither variant changes state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item name is required")]
    EmptyName,

    #[error("Item {0} no longer exists")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(StoreError::EmptyName.to_string(), "Item name is required");
        assert_eq!(
            StoreError::NotFound("42".into()).to_string(),
            "Item 42 no longer exists"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StorageError = io_err.into();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
