//! User-facing error surface used after teardown.

/// Presents a fatal error report to the player.
pub trait ErrorSurface {
    fn show_error(&self, text: &str);
}

/// Native message box via rfd. The report is also written to stderr in case
/// no dialog backend is available.
pub struct DialogErrorSurface {
    pub title: String,
}

impl Default for DialogErrorSurface {
    fn default() -> Self {
        Self {
            title: "Fatal error".to_string(),
        }
    }
}

impl ErrorSurface for DialogErrorSurface {
    fn show_error(&self, text: &str) {
        eprintln!("{}: {}", self.title, text);
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(self.title.as_str())
            .set_description(text)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
