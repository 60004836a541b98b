//! System clipboard access.

/// Errors that can occur while copying to the clipboard.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard rejected the text: {0}")]
    Rejected(String),
}

/// Something that can hold a copy of the transcript text
pub trait ClipboardSink {
    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Replace the clipboard contents with `text`
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard, through `arboard`.
///
/// On X11 and Wayland the process itself owns the selection. The contents are
/// handed to a clipboard manager when the handle is dropped if one is running;
/// without a manager the copied text is lost once `ytx` exits. The saved file
/// is the durable copy.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardSink for SystemClipboard {
    fn name(&self) -> &'static str {
        "system clipboard"
    }

    fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }
}

/// Clipboard stand-in that remembers what it was given.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingClipboard {
    copied: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingClipboard {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn copied(&self) -> Vec<String> {
        self.copied.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ClipboardSink for RecordingClipboard {
    fn name(&self) -> &'static str {
        "recording clipboard"
    }

    fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("no display".to_string()));
        }
        self.copied.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
