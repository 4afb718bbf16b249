//! Error types for configuration parsing

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while reading or decoding a configuration file
#[derive(Debug, Error)]
pub enum ConfError {
    /// The configuration (or an included file) could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration text
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        /// 1-based line of the offending character
        line: usize,
        /// 1-based column of the offending character
        column: usize,
        /// What the parser expected
        message: String,
    },

    /// A `$NAME` reference matched neither an enclosing key nor the variable environment
    #[error("variable reference for '{name}' on line {line} can not be found")]
    UndefinedVariable {
        /// Referenced variable name
        name: String,
        /// Line of the reference
        line: usize,
    },

    /// `include` directives nested deeper than [`crate::MAX_INCLUDE_DEPTH`]
    #[error("include depth exceeded while including {}", .path.display())]
    IncludeDepth {
        /// File whose inclusion exceeded the limit
        path: PathBuf,
    },
}

impl ConfError {
    /// Create a syntax error at the given position
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Line number associated with this error, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ConfError::Syntax { line, .. } | ConfError::UndefinedVariable { line, .. } => {
                Some(*line)
            }
            ConfError::Io { .. } | ConfError::IncludeDepth { .. } => None,
        }
    }
}
