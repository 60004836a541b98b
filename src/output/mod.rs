use chrono::NaiveDateTime;
use comfy_table::{presets, CellAlignment, Table};
use console::style;
use std::path::{Path, PathBuf};

use crate::source::{Snippet, TranscriptVariant};
use crate::{Result, YtxError};

pub mod clipboard;

pub use clipboard::{ClipboardError, ClipboardSink, SystemClipboard};

/// Render the variant list as a table with one row per variant
pub fn render_table(variants: &[TranscriptVariant]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::ASCII_FULL_CONDENSED)
        .set_header(["idx", "lang_code", "language", "type"]);

    for (index, variant) in variants.iter().enumerate() {
        table.add_row([
            index.to_string(),
            variant.language_code.clone(),
            variant.language_name.clone(),
            variant.kind_label().to_string(),
        ]);
    }

    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    table.to_string()
}

/// Join snippet texts with single spaces, keeping their order
pub fn assemble_text(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .map(|snippet| snippet.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build `{dir}/ytx-{YYYYMMDDHHMMSS}-{gen|man}{lang}-{video_id}.txt`
pub fn build_output_path(
    dir: &Path,
    video_id: &str,
    variant: &TranscriptVariant,
    timestamp: NaiveDateTime,
) -> PathBuf {
    dir.join(format!(
        "ytx-{}-{}{}-{}.txt",
        timestamp.format("%Y%m%d%H%M%S"),
        variant.kind_tag(),
        variant.language_code,
        video_id
    ))
}

/// Write the transcript to `path`, then mirror it to the clipboard if one is given
pub fn save_and_copy(text: &str, path: &Path, clipboard: Option<&dyn ClipboardSink>) -> Result<()> {
    fs_err::write(path, text)?;
    tracing::debug!("Wrote {} bytes to {}", text.len(), path.display());

    if let Some(clipboard) = clipboard {
        clipboard.copy_text(text)?;
        tracing::debug!("Copied transcript to clipboard via {}", clipboard.name());
    }

    Ok(())
}

/// Text written to stderr when a run fails.
///
/// A missing precedence match is a diagnostic followed by the full listing, so
/// an index can be picked with `--fetch`. Every other failure is one
/// `Error: ` line.
pub fn render_error(err: &YtxError) -> String {
    match err {
        YtxError::NoPrecedenceMatch { variants } => format!(
            "{}\nAvailable transcripts:\n{}",
            err,
            render_table(variants)
        ),
        _ => format!("{} {}", style("Error:").for_stderr().red().bold(), err),
    }
}
