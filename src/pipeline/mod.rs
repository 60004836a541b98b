use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Mode;
use crate::config::Config;
use crate::output::{self, ClipboardSink};
use crate::select;
use crate::source::{TranscriptSource, TranscriptVariant};
use crate::{Result, YtxError};

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The rendered listing, for `--info`
    Listed(String),

    /// The chosen transcript was written here
    Saved {
        path: PathBuf,
        variant: TranscriptVariant,
    },
}

/// Lists, selects, fetches and stores one video's transcript
pub struct TranscriptPipeline<'a, S: TranscriptSource> {
    source: S,
    config: Config,
    clipboard: &'a dyn ClipboardSink,
    show_progress: bool,
}

impl<'a, S: TranscriptSource> TranscriptPipeline<'a, S> {
    pub fn new(source: S, config: Config, clipboard: &'a dyn ClipboardSink) -> Self {
        Self {
            source,
            config,
            clipboard,
            show_progress: true,
        }
    }

    /// Show or hide the progress spinner
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run one invocation to completion. `now` stamps the output file name.
    pub async fn run(&self, video_id: &str, mode: Mode, now: NaiveDateTime) -> Result<Outcome> {
        let progress = self.spinner(format!(
            "Listing transcripts on {}...",
            self.source.service_name()
        ));
        let listed = self.source.list(video_id).await;
        progress.finish_and_clear();

        let variants = listed?;
        if variants.is_empty() {
            return Err(YtxError::EmptyResult);
        }
        tracing::info!("{} transcript(s) available for {}", variants.len(), video_id);

        let selected = match mode {
            Mode::Info => return Ok(Outcome::Listed(output::render_table(&variants))),
            Mode::Index(index) => select::select_by_index(&variants, index)?,
            Mode::Precedence => match select::select_by_precedence(&variants) {
                Some(variant) => variant,
                None => return Err(YtxError::NoPrecedenceMatch { variants }),
            },
        };
        tracing::info!(
            "Selected {} transcript in {} ({})",
            selected.kind_label(),
            selected.language_name,
            selected.language_code
        );

        let progress = self.spinner(format!("Fetching {} transcript...", selected.language_code));
        let fetched = self.source.fetch(&selected.handle).await;
        progress.finish_and_clear();

        let text = output::assemble_text(&fetched?);
        let path = output::build_output_path(&self.config.output.dir, video_id, selected, now);

        let clipboard = self.config.output.copy_to_clipboard.then_some(self.clipboard);
        output::save_and_copy(&text, &path, clipboard)?;

        Ok(Outcome::Saved {
            path,
            variant: selected.clone(),
        })
    }

    fn spinner(&self, message: String) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            progress.set_style(style);
        }
        progress.set_message(message);
        progress.enable_steady_tick(Duration::from_millis(100));
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::clipboard::RecordingClipboard;
    use crate::source::{Snippet, SourceError, TranscriptHandle};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Source {}

        #[async_trait]
        impl TranscriptSource for Source {
            async fn list(&self, video_id: &str) -> std::result::Result<Vec<TranscriptVariant>, SourceError>;
            async fn fetch(&self, handle: &TranscriptHandle) -> std::result::Result<Vec<Snippet>, SourceError>;
            fn service_name(&self) -> &'static str;
        }
    }

    fn variant(is_generated: bool, code: &str) -> TranscriptVariant {
        TranscriptVariant {
            language_code: code.to_string(),
            language_name: format!("Language {code}"),
            is_generated,
            handle: TranscriptHandle::new("abc123", format!("https://example.com/timedtext?lang={code}")),
        }
    }

    fn snippets(texts: &[&str]) -> Vec<Snippet> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Snippet {
                text: text.to_string(),
                start: i as f64,
                duration: 1.0,
            })
            .collect()
    }

    fn source_listing(variants: Vec<TranscriptVariant>) -> MockSource {
        let mut source = MockSource::new();
        source.expect_service_name().return_const("Mock");
        source
            .expect_list()
            .with(eq("abc123"))
            .times(1)
            .returning(move |_| Ok(variants.clone()));
        source
    }

    fn config_in(dir: &tempfile::TempDir) -> Config {
        Config::default().with_output_dir(Some(dir.path().to_path_buf()))
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn run(pipeline: &TranscriptPipeline<'_, MockSource>, mode: Mode) -> Result<Outcome> {
        tokio_test::block_on(pipeline.run("abc123", mode, now()))
    }

    #[test]
    fn test_empty_listing_fails_before_selection_in_every_mode() {
        for mode in [Mode::Info, Mode::Index(0), Mode::Precedence] {
            let dir = tempfile::tempdir().unwrap();
            let clipboard = RecordingClipboard::default();
            let mut source = source_listing(Vec::new());
            source.expect_fetch().never();

            let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
            let err = run(&pipeline, mode).unwrap_err();

            assert!(matches!(err, YtxError::EmptyResult), "{mode:?}: {err:?}");
            assert!(clipboard.copied().is_empty());
        }
    }

    #[test]
    fn test_info_mode_renders_listing_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let mut source = source_listing(vec![variant(false, "pl"), variant(true, "en")]);
        source.expect_fetch().never();

        let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
        let table = match run(&pipeline, Mode::Info).unwrap() {
            Outcome::Listed(table) => table,
            other => panic!("expected a listing, got {other:?}"),
        };
        assert!(table.contains("Language pl"));
        assert!(table.contains("Language en"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_precedence_mode_saves_and_copies() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let mut source = source_listing(vec![
            variant(true, "en-US"),
            variant(false, "en"),
            variant(false, "pl"),
        ]);
        source
            .expect_fetch()
            .withf(|handle| handle.url().ends_with("lang=pl"))
            .times(1)
            .returning(|_| Ok(snippets(&["Dzień", "dobry"])));

        let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
        let outcome = run(&pipeline, Mode::Precedence).unwrap();

        let expected_path = dir.path().join("ytx-20240101120000-manpl-abc123.txt");
        match outcome {
            Outcome::Saved { path, variant } => {
                assert_eq!(path, expected_path);
                assert_eq!(variant.language_code, "pl");
                assert!(!variant.is_generated);
            }
            other => panic!("expected a saved transcript, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(&expected_path).unwrap(), "Dzień dobry");
        assert_eq!(clipboard.copied(), ["Dzień dobry"]);
    }

    #[test]
    fn test_index_mode_uses_listing_position() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let mut source = source_listing(vec![variant(false, "pl"), variant(true, "fr")]);
        source
            .expect_fetch()
            .withf(|handle| handle.url().ends_with("lang=fr"))
            .times(1)
            .returning(|_| Ok(snippets(&["Bonjour", "tout", "le", "monde"])));

        let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
        let outcome = run(&pipeline, Mode::Index(1)).unwrap();

        let expected_path = dir.path().join("ytx-20240101120000-genfr-abc123.txt");
        assert!(matches!(outcome, Outcome::Saved { ref path, .. } if *path == expected_path));
        assert_eq!(
            std::fs::read_to_string(&expected_path).unwrap(),
            "Bonjour tout le monde"
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let mut source = source_listing(vec![variant(false, "pl"), variant(true, "fr")]);
        source.expect_fetch().never();

        let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
        let err = run(&pipeline, Mode::Index(2)).unwrap_err();

        assert_eq!(err.to_string(), "Index 2 out of range. Available: 0-1");
    }

    #[test]
    fn test_no_precedence_match_carries_listing() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let listed = vec![variant(true, "fr"), variant(false, "de")];
        let mut source = source_listing(listed.clone());
        source.expect_fetch().never();

        let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
        let err = run(&pipeline, Mode::Precedence).unwrap_err();

        match err {
            YtxError::NoPrecedenceMatch { variants } => assert_eq!(variants, listed),
            other => panic!("expected NoPrecedenceMatch, got {other:?}"),
        }
    }

    #[test]
    fn test_listing_failures_are_mapped() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let mut source = MockSource::new();
        source.expect_service_name().return_const("Mock");
        source.expect_list().returning(|video_id| {
            Err(SourceError::TranscriptsDisabled {
                video_id: video_id.to_string(),
            })
        });
        source.expect_fetch().never();

        let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
        let err = run(&pipeline, Mode::Precedence).unwrap_err();

        assert_eq!(err.to_string(), "Transcripts are disabled for video: abc123");
    }

    #[test]
    fn test_fetch_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let mut source = source_listing(vec![variant(true, "en")]);
        source.expect_fetch().returning(|handle| {
            Err(SourceError::Unretrievable {
                video_id: handle.video_id().to_string(),
                reason: "the transcript requires a proof-of-origin token".to_string(),
            })
        });

        let pipeline = TranscriptPipeline::new(source, config_in(&dir), &clipboard).with_progress(false);
        let err = run(&pipeline, Mode::Precedence).unwrap_err();

        assert!(matches!(err, YtxError::RetrievalFailure { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(clipboard.copied().is_empty());
    }

    #[test]
    fn test_clipboard_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::failing();
        let mut source = source_listing(vec![variant(false, "en")]);
        source.expect_fetch().returning(|_| Ok(snippets(&["Hello", "world"])));

        let mut config = config_in(&dir);
        config.output.copy_to_clipboard = false;

        let pipeline = TranscriptPipeline::new(source, config, &clipboard).with_progress(false);
        let outcome = run(&pipeline, Mode::Precedence).unwrap();

        assert!(matches!(outcome, Outcome::Saved { .. }));
        let saved = dir.path().join("ytx-20240101120000-manen-abc123.txt");
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "Hello world");
    }
}
