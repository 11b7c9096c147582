use std::any::Any;

use beat_core::ConfigError;
use beat_platform::PlatformError;
use beat_render::RendererError;
use thiserror::Error;

use crate::registry::SubsystemId;

/// Anything that stops the ordered construction of subsystems.
#[derive(Debug, Error)]
pub enum SubsystemInitError {
    /// Renderer selection already produced a player-facing report.
    #[error("{0}")]
    Renderer(#[from] RendererError),
    #[error("failed to open the OS event loop: {0}")]
    Platform(#[from] PlatformError),
    #[error("{subsystem} failed to start: {source}")]
    Io {
        subsystem: SubsystemId,
        #[source]
        source: std::io::Error,
    },
    #[error("{subsystem} was constructed out of order")]
    OutOfOrder { subsystem: SubsystemId },
    #[error("{0} is not constructed")]
    Missing(SubsystemId),
}

/// Anything escaping the frame loop.
#[derive(Debug, Error)]
pub enum FatalRuntimeError {
    #[error(transparent)]
    Renderer(#[from] RendererError),
    #[error("texture reload failed: {0}")]
    TextureReload(String),
    #[error(transparent)]
    Subsystems(#[from] SubsystemInitError),
    /// A subsystem panicked while the game was running.
    #[error("unexpected error: {0}")]
    Panic(String),
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Top-level outcome of a run. The `Display` text is the error report shown
/// to the player.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Init(#[from] SubsystemInitError),
    #[error(transparent)]
    Runtime(#[from] FatalRuntimeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
