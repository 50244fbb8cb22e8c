use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScriptaError>;

#[derive(Debug, Error)]
pub enum ScriptaError {
    #[error("catalog {path} is corrupt: {reason}")]
    CorruptCatalog { path: PathBuf, reason: String },
    #[error("invalid document date `{date}`: expected YYYY-MM-DD")]
    InvalidDate { date: String },
    #[error("archive target already exists: {path}")]
    PlacementConflict { path: PathBuf },
    #[error("no catalog record with index {index}")]
    NotFound { index: u64 },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("title suggestion failed: {0}")]
    Titler(String),
    #[error("{cause}; left in archive tree: {}", join_paths(.stranded))]
    RestoreFailed {
        cause: Box<ScriptaError>,
        stranded: Vec<PathBuf>,
    },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ScriptaError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable short code used in warn lines and audit events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CorruptCatalog { .. } => "CORRUPT_CATALOG",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::PlacementConflict { .. } => "PLACEMENT_CONFLICT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Io { .. } => "IO_FAILURE",
            Self::Titler(_) => "TITLER_FAILED",
            Self::RestoreFailed { .. } => "RESTORE_FAILED",
        }
    }
}

/// Attaches a path-bearing context to raw `std::io` results.
pub trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| ScriptaError::io(f(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_context_keeps_message_and_source() {
        let raw: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = raw.io_context(|| "failed to read /tmp/x").unwrap_err();
        assert_eq!(err.code(), "IO_FAILURE");
        assert_eq!(err.to_string(), "failed to read /tmp/x: gone");
    }

    #[test]
    fn invalid_date_names_offending_value() {
        let err = ScriptaError::InvalidDate {
            date: "2024-13-40".to_string(),
        };
        assert!(err.to_string().contains("2024-13-40"));
    }

    #[test]
    fn restore_failure_names_stranded_files() {
        let err = ScriptaError::RestoreFailed {
            cause: Box::new(ScriptaError::NotFound { index: 3 }),
            stranded: vec![PathBuf::from("/a/1.txt"), PathBuf::from("/a/2.txt")],
        };
        assert_eq!(err.code(), "RESTORE_FAILED");
        assert_eq!(
            err.to_string(),
            "no catalog record with index 3; left in archive tree: /a/1.txt, /a/2.txt"
        );
    }
}
