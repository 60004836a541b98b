use anyhow::Result;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytx::output::render_error;
use ytx::source::YoutubeTranscriptSource;
use ytx::{Cli, Config, Outcome, SystemClipboard, TranscriptPipeline, YtxError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "ytx=debug" } else { "ytx=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?.with_output_dir(cli.output_dir.clone());
    let source = YoutubeTranscriptSource::new(config.youtube.accept_language.clone())
        .map_err(YtxError::from)?;
    let clipboard = SystemClipboard::new();

    let pipeline = TranscriptPipeline::new(source, config, &clipboard).with_progress(!cli.quiet);
    let now = chrono::Local::now().naive_local();

    match pipeline.run(&cli.video_id, cli.mode(), now).await? {
        Outcome::Listed(table) => println!("{}", table),
        Outcome::Saved { path, .. } => println!("Saved: {}", path.display()),
    }

    Ok(())
}

fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<YtxError>() {
        Some(ytx_err) => {
            if let YtxError::RetrievalFailure { reason, .. } = ytx_err {
                tracing::debug!("Retrieval failed: {}", reason);
            }
            eprintln!("{}", render_error(ytx_err));
            ExitCode::from(ytx_err.exit_code())
        }
        None => {
            eprintln!("{} {:#}", style("Error:").for_stderr().red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
