//! Renderer selection.
//!
//! Players should never have to pick a graphics API. The selector:
//!
//!   1. honours an explicitly configured backend, rejecting unknown names;
//!   2. consults the compatibility table, which overrides the configured
//!      choice for adapters known to break on the primary backend;
//!   3. tries the chosen backend; a "can't run here" failure of the primary
//!      (not installed, no acceleration) gets exactly one fallback attempt;
//!   4. rejects an unaccelerated primary unless configuration allows it,
//!      again trying the fallback once.
//!
//! Every terminal failure carries a player-facing report explaining what to
//! do about it.

use crate::backend::BackendKind;
use crate::compat::{forced_backend, CompatRule};
use crate::error::RendererError;
use crate::renderer::Renderer;

/// Constructs backends and describes the installed hardware.
pub trait BackendFactory {
    /// Human-readable adapter/driver description used for compatibility
    /// matching. Empty if the hardware can't be probed.
    fn hardware_description(&mut self) -> String;

    fn create(&mut self, kind: BackendKind) -> Result<Box<dyn Renderer>, RendererError>;
}

#[derive(Debug, Clone, Copy)]
pub struct SelectionConfig<'a> {
    /// Configured backend name; `None` or empty selects automatically.
    pub forced: Option<&'a str>,
    pub allow_unaccelerated: bool,
    pub rules: &'a [CompatRule],
}

pub fn create_renderer(
    config: SelectionConfig<'_>,
    factory: &mut dyn BackendFactory,
) -> Result<Box<dyn Renderer>, RendererError> {
    let forced_name = config.forced.map(str::trim).filter(|n| !n.is_empty());
    let forced = match forced_name {
        Some(name) => {
            log::warn!("Forcing renderer: {}", name);
            let kind = BackendKind::from_name(name)
                .ok_or_else(|| RendererError::UnknownBackend(name.to_string()))?;
            Some(kind)
        }
        None => None,
    };

    let hardware = factory.hardware_description();
    log::info!(
        "Display adapter: {}",
        if hardware.is_empty() {
            "<unknown>"
        } else {
            hardware.as_str()
        }
    );
    let required = forced_backend(config.rules, &hardware);
    if let Some(kind) = required {
        log::warn!("Adapter \"{}\" requires the {} renderer", hardware, kind);
    }

    let header = if forced.is_some() {
        "(WARNING: Renderer was forced)\n\n"
    } else {
        "There was an error while initializing your video card.\n\n"
    };
    let fail = |report: String, cause: RendererError| RendererError::Selection {
        report: format!("{header}{report}"),
        cause: Box::new(cause),
    };

    if let Some(kind) = required {
        // Listed hardware: don't try anything else, it only produces bug reports.
        return factory.create(kind).map_err(|err| {
            let reason = match err.root_cause() {
                RendererError::BackendNotInstalled { .. } => "it is not installed.".to_string(),
                RendererError::NoHardwareAcceleration { .. } => {
                    "your system is reporting that hardware acceleration is not available. \
                     You can download an updated driver from your card's manufacturer."
                        .to_string()
                }
                other => format!("it failed to start: {other}"),
            };
            fail(
                format!(
                    "Your display adapter, \"{hardware}\", requires the {kind} renderer, \
                     but {reason}"
                ),
                err,
            )
        });
    }

    let first = forced.unwrap_or(BackendKind::PRIMARY);
    let renderer = match factory.create(first) {
        Ok(renderer) => renderer,
        Err(err) if err.allows_fallback() => {
            let Some(fallback) = first.fallback() else {
                return Err(fail(format!("{err}."), err));
            };
            log::warn!("{err}; falling back to the {fallback} renderer");
            return factory.create(fallback).map_err(|fallback_err| {
                let reason = match fallback_err.root_cause() {
                    RendererError::BackendNotInstalled { detail, .. } => {
                        format!("is not installed either ({detail}).")
                    }
                    RendererError::NoHardwareAcceleration { .. } => {
                        "has no hardware acceleration either. Please install the latest \
                         video drivers from your graphics card vendor."
                            .to_string()
                    }
                    other => format!("failed to start: {other}"),
                };
                fail(format!("{err}, and the {fallback} renderer {reason}"), fallback_err)
            });
        }
        Err(err) => return Err(fail(format!("{err}."), err)),
    };

    if config.allow_unaccelerated || !renderer.is_software_renderer() {
        log::info!("Renderer: {} on {}", renderer.backend(), renderer.adapter_name());
        return Ok(renderer);
    }

    log::warn!("The {} renderer is unaccelerated ({})", first, renderer.adapter_name());
    drop(renderer);
    let Some(fallback) = first.fallback() else {
        let err = RendererError::NoHardwareAcceleration { backend: first };
        return Err(fail(
            format!(
                "{first} hardware acceleration is not available on your system. \
                 Please install the latest video drivers from your graphics card vendor."
            ),
            err,
        ));
    };
    factory.create(fallback).map_err(|err| {
        let reason = match err.root_cause() {
            RendererError::BackendNotInstalled { .. } => format!(
                "the {fallback} renderer is not installed. You may also need updated drivers \
                 from your card's manufacturer."
            ),
            RendererError::NoHardwareAcceleration { .. } => format!(
                "neither is {fallback} acceleration. Please install the latest video drivers \
                 from your graphics card vendor."
            ),
            other => format!("the {fallback} renderer failed to start: {other}"),
        };
        fail(
            format!("{first} hardware acceleration is not available on your system, and {reason}"),
            err,
        )
    })
}
