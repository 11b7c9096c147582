use thiserror::Error;

use crate::backend::BackendKind;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("unknown renderer '{0}' (expected 'native' or 'opengl')")]
    UnknownBackend(String),
    #[error("the {backend} renderer is not installed: {detail}")]
    BackendNotInstalled { backend: BackendKind, detail: String },
    #[error("the {backend} renderer reports no hardware acceleration")]
    NoHardwareAcceleration { backend: BackendKind },
    #[error("{0}")]
    Generic(String),
    /// A selection failure with the player-facing explanation attached.
    #[error("{report}")]
    Selection {
        report: String,
        #[source]
        cause: Box<RendererError>,
    },
}

impl RendererError {
    /// The underlying reason, looking through any selection report.
    pub fn root_cause(&self) -> &RendererError {
        match self {
            Self::Selection { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Failures that mean "this backend can't run here", as opposed to a
    /// broken installation; only these trigger a fallback attempt.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::BackendNotInstalled { .. } | Self::NoHardwareAcceleration { .. }
        )
    }
}
