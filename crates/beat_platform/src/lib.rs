pub mod dialog;
pub mod events;
pub mod gamepad;
pub mod hooks;
pub mod priority;
pub mod window;

pub use dialog::{DialogErrorSurface, ErrorSurface};
pub use events::{EventSource, OsEvent, Platform, PlatformError};
pub use priority::PriorityHint;
pub use window::PlatformConfig;
