use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by vault operations.
///
/// Per-note front-matter problems never show up here; they degrade to an
/// empty front-matter map while scanning.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Could not find note: {0}")]
    NoteNotFound(String),

    #[error("Multiple notes share basename '{basename}' ({}). Use a path instead.", .candidates.join(", "))]
    AmbiguousNote {
        basename: String,
        candidates: Vec<String>,
    },

    #[error("Invalid plan {}: {message}", .path.display())]
    PlanFormat { path: PathBuf, message: String },

    #[error("Plan has {} problem(s)", .0.len())]
    Validation(Vec<String>),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;

impl VaultError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VaultError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error: 1 for validation failures,
    /// 2 for bad user input, 3 for I/O and internal invariant failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            VaultError::Validation(_) => 1,
            VaultError::Config { .. }
            | VaultError::InvalidInput(_)
            | VaultError::NoteNotFound(_)
            | VaultError::AmbiguousNote { .. }
            | VaultError::PlanFormat { .. } => 2,
            VaultError::Io { .. } | VaultError::Invariant(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_category() {
        assert_eq!(VaultError::Validation(vec!["x".into()]).exit_code(), 1);
        assert_eq!(VaultError::InvalidInput("bad".into()).exit_code(), 2);
        assert_eq!(VaultError::Invariant("gone".into()).exit_code(), 3);
    }

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = VaultError::AmbiguousNote {
            basename: "old".into(),
            candidates: vec!["a/old.md".into(), "b/old.md".into()],
        };
        let message = err.to_string();
        assert!(message.contains("'old'"));
        assert!(message.contains("a/old.md, b/old.md"));
    }
}
