// Error types for the storage side of the dashboard.
// Layout operations never fail outward; only file I/O does.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store path has no parent directory: {0}")]
    NoParent(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let e = StoreError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(format!("{e}"), "I/O error: gone");
    }

    #[test]
    fn json_error_converts() {
        let parse = serde_json::from_str::<u32>("not json").unwrap_err();
        let e: StoreError = parse.into();
        assert!(format!("{e}").starts_with("JSON error:"));
    }

    #[test]
    fn no_parent_display() {
        let e = StoreError::NoParent("/".into());
        assert_eq!(format!("{e}"), "store path has no parent directory: /");
    }
}
