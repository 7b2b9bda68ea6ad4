//! `tandem-bridge` binary.
//!
//! With `--server`, loads the models and speaks the line protocol on
//! stdin/stdout. Otherwise translates the positional text once and prints
//! a single JSON object.

mod cli;
mod loader;

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use serde_json::json;
use tandem_core::logging::{
    BOOTSTRAP_LEVEL, effective_level, init_subscriber, with_bootstrap_subscriber,
};
use tandem_rpc::{ExitReason, InitFailure, ProtocolServer};
use tandem_settings::{BridgeSettings, settings_path};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tracing::{error, info};

use crate::cli::{Cli, SingleShot};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let single = if cli.server {
        None
    } else {
        match cli.single_shot() {
            Some(single) => Some(single),
            None => Cli::command()
                .error(
                    clap::error::ErrorKind::MissingRequiredArgument,
                    "<TEXT> <SOURCE> <TARGET> are required unless --server is given",
                )
                .exit(),
        }
    };

    let config_path: PathBuf = cli.config.clone().unwrap_or_else(settings_path);
    let loaded = with_bootstrap_subscriber(effective_level(cli.verbose, BOOTSTRAP_LEVEL), || {
        loader::load_settings(&config_path)
    });
    let level = loaded
        .as_ref()
        .map_or(BOOTSTRAP_LEVEL, |settings| settings.logging.level.as_str());
    init_subscriber(effective_level(cli.verbose, level));
    info!(settings = %config_path.display(), server = cli.server, "starting tandem-bridge");

    let settings = loaded.map(|mut settings| {
        cli.apply_overrides(&mut settings);
        settings
    });

    let code = match single {
        None => {
            let input = BufReader::new(tokio::io::stdin());
            serve(input, tokio::io::stdout(), settings).await?.exit_code()
        }
        Some(single) => translate_once(settings, &single),
    };
    std::process::exit(code);
}

/// Run the line protocol until shutdown, end of input, or init failure.
///
/// A settings failure is reported through the protocol like any other
/// initialization failure.
async fn serve<R, W>(
    reader: R,
    writer: W,
    settings: Result<BridgeSettings, InitFailure>,
) -> anyhow::Result<ExitReason>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut server = ProtocolServer::new(writer);
    let reason = server
        .run(reader, move || {
            settings.and_then(|settings| loader::build_session(&settings))
        })
        .await
        .context("protocol stream failed")?;
    info!(?reason, "server stopped");
    Ok(reason)
}

/// Translate one sentence and print the result. Returns the exit code.
fn translate_once(settings: Result<BridgeSettings, InitFailure>, single: &SingleShot) -> i32 {
    let outcome = settings
        .and_then(|settings| loader::build_session(&settings))
        .map_err(|failure| failure.message)
        .and_then(|session| {
            session
                .translate_and_align(&single.text, &single.source, &single.target)
                .map_err(|e| e.to_string())
        });

    match outcome {
        Ok(translation) => {
            println!(
                "{}",
                json!({
                    "translation": translation.text,
                    "alignments": translation.links,
                    "source": single.source,
                    "target": single.target,
                })
            );
            0
        }
        Err(message) => {
            error!(error = %message, "translation failed");
            println!("{}", json!({ "error": message }));
            1
        }
    }
}
