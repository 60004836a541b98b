//! ytx - download YouTube video transcripts as plain text
//!
//! This library lists the transcript variants a video offers, picks one either by
//! explicit index or by a fixed language/kind precedence, and writes the joined
//! transcript text to a timestamped file while mirroring it to the clipboard.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod select;
pub mod source;

pub use cli::{Cli, Mode};
pub use config::Config;
pub use output::{ClipboardError, ClipboardSink, SystemClipboard};
pub use pipeline::{Outcome, TranscriptPipeline};
pub use source::{Snippet, SourceError, TranscriptHandle, TranscriptSource, TranscriptVariant};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, YtxError>;

/// Every way a single invocation can fail once arguments are parsed
#[derive(thiserror::Error, Debug)]
pub enum YtxError {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Transcripts are disabled for video: {0}")]
    Disabled(String),

    #[error("Could not retrieve transcripts for video: {video_id}")]
    RetrievalFailure { video_id: String, reason: String },

    #[error("Failed to fetch transcripts: {0}")]
    Fetch(String),

    #[error("No transcripts available for this video.")]
    EmptyResult,

    #[error("Index {index} out of range. Available: 0-{max}")]
    OutOfRange { index: i64, max: usize },

    #[error("No matching transcript found (pl/en, manual/generated).")]
    NoPrecedenceMatch { variants: Vec<TranscriptVariant> },

    #[error("Failed to save transcript: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to copy transcript to clipboard: {0}")]
    Clipboard(#[from] ClipboardError),
}

impl YtxError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl From<SourceError> for YtxError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::VideoUnavailable { video_id } => YtxError::NotFound(video_id),
            SourceError::TranscriptsDisabled { video_id } => YtxError::Disabled(video_id),
            SourceError::Unretrievable { video_id, reason } => {
                YtxError::RetrievalFailure { video_id, reason }
            }
            other => YtxError::Fetch(other.to_string()),
        }
    }
}
