use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ytx",
    about = "Download YouTube video transcripts as plain text.",
    version,
    long_about = "Download a YouTube video's transcript as plain text. Without flags the best transcript is picked automatically (manual Polish, manual English, generated Polish, generated English), saved under the output directory and copied to the clipboard."
)]
pub struct Cli {
    /// YouTube video ID (e.g. dQw4w9WgXcQ)
    #[arg(value_name = "VIDEO_ID")]
    pub video_id: String,

    /// List available transcripts
    #[arg(short, long, conflicts_with = "fetch")]
    pub info: bool,

    /// Fetch transcript at index N from -i table
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub fetch: Option<i64>,

    /// Directory for saved transcripts (overrides the config file)
    #[arg(short, long, value_name = "DIR", env = "YTX_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

/// How a transcript is chosen from the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Only print the listing
    Info,
    /// Take the variant at this position
    Index(i64),
    /// Apply the language/kind precedence
    Precedence,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        match (self.info, self.fetch) {
            (true, _) => Mode::Info,
            (false, Some(index)) => Mode::Index(index),
            (false, None) => Mode::Precedence,
        }
    }
}
