use async_trait::async_trait;

pub mod youtube;

pub use youtube::YoutubeTranscriptSource;

/// Opaque reference to a single transcript, usable to fetch its text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptHandle {
    video_id: String,
    url: String,
}

impl TranscriptHandle {
    pub fn new(video_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            url: url.into(),
        }
    }

    /// Video the transcript belongs to
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Service location of the transcript body
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// One transcript offered for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptVariant {
    /// Language code as reported by the service (e.g. `en`, `en-GB`)
    pub language_code: String,

    /// Human readable language name
    pub language_name: String,

    /// Whether the transcript was produced by speech recognition
    pub is_generated: bool,

    /// Reference used to fetch the full text
    pub handle: TranscriptHandle,
}

impl TranscriptVariant {
    /// `generated` or `manual`, as shown in listings
    pub fn kind_label(&self) -> &'static str {
        if self.is_generated {
            "generated"
        } else {
            "manual"
        }
    }

    /// Short tag used in output file names
    pub fn kind_tag(&self) -> &'static str {
        if self.is_generated {
            "gen"
        } else {
            "man"
        }
    }
}

/// A timed piece of transcript text
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Failures reported by a transcript source
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("video {video_id} is unavailable")]
    VideoUnavailable { video_id: String },

    #[error("transcripts are disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("could not retrieve transcripts for video {video_id}: {reason}")]
    Unretrievable { video_id: String, reason: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Where transcripts come from
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// List the transcript variants available for a video, in listing order
    async fn list(&self, video_id: &str) -> Result<Vec<TranscriptVariant>, SourceError>;

    /// Fetch the timed snippets of one transcript, in playback order
    async fn fetch(&self, handle: &TranscriptHandle) -> Result<Vec<Snippet>, SourceError>;

    /// Name of the backing service
    fn service_name(&self) -> &'static str;
}
