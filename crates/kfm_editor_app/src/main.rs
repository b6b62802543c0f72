// SPDX-License-Identifier: MIT OR Apache-2.0
//! KFM Editor - command-line front end.
//!
//! Opens a KFM file, replays an optional edit script through the undoable
//! command engine, prints the tree view and optionally writes the result.

use clap::Parser;
use kfm_editor_app::{script, TranscriptBridge, TreeView};
use kfm_editor_core::{Session, SETTINGS_FILE_NAME};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "kfm_editor", version, about = "Inspect and edit Gamebryo KFM files")]
struct Cli {
    /// KFM file to open
    input: PathBuf,

    /// RON edit script to replay after loading
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Where to save the edited document
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file
    #[arg(long, default_value = SETTINGS_FILE_NAME)]
    settings: PathBuf,

    /// Print the tree fully expanded
    #[arg(long)]
    expand_all: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut session, settings_error) = match Session::from_settings_file(&cli.settings) {
        Ok(session) => (session, None),
        Err(error) => (Session::new(), Some(error)),
    };
    let settings = session.settings().clone();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(TranscriptBridge::new(session.dispatcher().transcript().clone()))
        .init();

    tracing::debug!("Starting KFM Editor v{}", env!("CARGO_PKG_VERSION"));
    if let Some(error) = settings_error {
        tracing::warn!("Ignoring settings {:?}: {error}", cli.settings);
    }

    if let Err(error) = session.open(&cli.input) {
        tracing::error!("Could not open {:?}: {error}", cli.input);
        return ExitCode::FAILURE;
    }

    let mut view = TreeView::new();

    if let Some(path) = &cli.script {
        match script::load(path) {
            Ok(steps) => {
                let report = script::run(&steps, &mut session, &mut view);
                tracing::info!(applied = report.applied, failed = report.failed, "Script finished");
            }
            Err(error) => tracing::error!("Could not load script {:?}: {error}", path),
        }
    }

    let Some(document) = session.dispatcher().document() else {
        return ExitCode::FAILURE;
    };
    if cli.expand_all {
        view.expand_all(document);
    }
    println!("{}", session.title());
    print!("{}", view.render(document));

    if settings.echo_transcript {
        println!();
        print!("{}", session.dispatcher().transcript().text());
    }

    if let Some(output) = &cli.output {
        if let Err(error) = session.save_as(output) {
            tracing::error!("Could not save {:?}: {error}", output);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "kfm_editor",
            "actor.kfm",
            "--script",
            "edits.ron",
            "-o",
            "out.kfm",
            "--expand-all",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("actor.kfm"));
        assert_eq!(cli.script, Some(PathBuf::from("edits.ron")));
        assert_eq!(cli.output, Some(PathBuf::from("out.kfm")));
        assert_eq!(cli.settings, PathBuf::from(SETTINGS_FILE_NAME));
        assert!(cli.expand_all);
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["kfm_editor"]).is_err());
    }
}
