//! Error types for the render harness
//!
//! Every variant is fatal to the test case that produced it. Comparison
//! mismatches are not errors; see [`crate::Mismatch`].

use thiserror::Error;

/// Main error type for rendering and decoding
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The template engine could not be invoked or reported a failure
    #[error("render failure for release {release}: {message}")]
    Render {
        /// Release being rendered
        release: String,
        /// Engine output or invocation error
        message: String,
    },

    /// A rendered document could not be decoded
    #[error("decode failure for {id}: {message}")]
    Decode {
        /// Slot identifier, or the document position when unrouted
        id: String,
        /// Underlying decode error
        message: String,
    },

    /// The designated configuration artifact is missing
    #[error("missing required artifact {id}: {message}")]
    MissingArtifact {
        /// Slot identifier of the missing artifact
        id: String,
        /// What exactly was absent
        message: String,
    },

    /// The rendered server configuration failed to parse
    #[error("configuration parse error: {0}")]
    Conf(#[from] natschart_conf::ConfError),

    /// Scratch space could not be created or written
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`HarnessError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Template engine invocation failed
    RenderFailure,
    /// A routed document or the configuration text failed to decode
    DecodeFailure,
    /// The designated configuration slot is absent or incomplete
    MissingRequiredArtifact,
    /// Scratch filesystem failure
    Io,
}

impl HarnessError {
    /// Create a render error for the given release
    pub fn render(release: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Render {
            release: release.into(),
            message: msg.into(),
        }
    }

    /// Create a decode error for the given slot or document
    pub fn decode(id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            id: id.into(),
            message: msg.into(),
        }
    }

    /// Create a missing-artifact error for the given slot
    pub fn missing_artifact(id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MissingArtifact {
            id: id.into(),
            message: msg.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::Render { .. } => ErrorKind::RenderFailure,
            HarnessError::Decode { .. } | HarnessError::Conf(_) => ErrorKind::DecodeFailure,
            HarnessError::MissingArtifact { .. } => ErrorKind::MissingRequiredArtifact,
            HarnessError::Io(_) => ErrorKind::Io,
        }
    }

    /// Slot identifier this error is associated with, if any
    pub fn slot_id(&self) -> Option<&str> {
        match self {
            HarnessError::Decode { id, .. } | HarnessError::MissingArtifact { id, .. } => Some(id),
            HarnessError::Render { .. } | HarnessError::Conf(_) | HarnessError::Io(_) => None,
        }
    }
}
