//! Process-level hooks established before anything else runs.

use std::io;
use std::path::Path;

/// Routes panics through the log facade as well as the default stderr
/// report. Installed before logging exists; once a logger is set, the same
/// hook starts reaching it.
pub fn install_crash_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("Fatal panic: {info}");
        previous(info);
    }));
}

/// Makes the executable's directory the working directory when `marker`
/// (the content folder) is not found in the current one, so relative data
/// paths resolve no matter where the binary was launched from.
pub fn change_to_executable_dir(marker: &str) -> io::Result<()> {
    if Path::new(marker).exists() {
        return Ok(());
    }
    let exe = std::env::current_exe()?;
    match exe.parent() {
        Some(dir) => std::env::set_current_dir(dir),
        None => Ok(()),
    }
}
