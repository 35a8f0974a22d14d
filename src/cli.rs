/// # lesson-sync CLI Interface (Module)
///
/// Command parsing and orchestration for pushing lessons. The push workflow itself lives in
/// [`crate::synchronise`]; this module resolves the target environment, authenticates, reads the
/// lesson index and feeds lessons to the client one at a time.
///
/// Use [`run`] with a constructed [`Cli`] for programmatic or integration-test invocation.
use crate::config::{Environment, Target};
use crate::error::SyncError;
use crate::lesson::Lesson;
use crate::load_config::{load_config, DEFAULT_CONFIG_FILE};
use crate::prompt::{ask_target, TerminalPrompt};
use crate::synchronise::SyncClient;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for lesson-sync: push lesson folders to the learning platform.
#[derive(Parser)]
#[clap(
    name = "lesson-sync",
    version,
    about = "Zip lesson folders and link them to their lessons on the learning platform"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push lessons listed in the lesson index (or only the given paths)
    Sync {
        /// Path to the YAML lesson index
        #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Environment to push to: 's'/'staging' or 'p'/'production'
        #[clap(long, env = "LEARNING_API_ENVIRONMENT")]
        target: Option<Target>,

        /// Access token; skips the interactive login
        #[clap(long, env = "LEARNING_API_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Override the environment's API base URL
        #[clap(long, env = "LEARNING_API_URL", hide = true)]
        api_url: Option<String>,

        /// Don't print URLs after uploading a lesson
        #[clap(long)]
        hide_urls: bool,

        /// Lesson folders to push; defaults to every lesson in the index
        paths: Vec<PathBuf>,
    },
}

/// Pick the target from the flag/environment, or ask for it.
pub fn resolve_target(target: Option<Target>, token_supplied: bool) -> Result<Target> {
    match target {
        Some(target) => Ok(target),
        None if token_supplied => bail!(
            "Set 'LEARNING_API_ENVIRONMENT' variable to 'staging' or 'production' when using the \
             'LEARNING_API_TOKEN' environment variable. You can unset the token using the \
             command:\n\n    unset LEARNING_API_TOKEN\n"
        ),
        None => Ok(ask_target(&mut std::io::stdin().lock(), &mut std::io::stdout())?),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync {
            config,
            target,
            token,
            api_url,
            hide_urls,
            paths,
        } => {
            let target = resolve_target(target, token.is_some())?;
            let index = load_config(&config)?;
            let selection = index.select(target, &paths)?;
            for path in &selection.skipped {
                println!("ℹ️ No ID found for {path}; skipping");
            }

            let mut environment = target.environment();
            if let Some(api_url) = api_url {
                environment = environment.with_api_url(api_url);
            }
            sync(environment, token, hide_urls, selection.lessons).await
        }
    }
}

async fn sync(
    environment: Environment,
    token: Option<String>,
    hide_urls: bool,
    lessons: Vec<(PathBuf, crate::contract::RemoteId)>,
) -> Result<()> {
    tracing::info!(
        command = "sync",
        environment = %environment.name,
        lessons = lessons.len(),
        "Starting sync"
    );
    let client = SyncClient::connect(environment, token, &TerminalPrompt)
        .await?
        .hide_urls(hide_urls);

    for (path, remote_id) in lessons {
        let mut lesson = Lesson::new(path, remote_id)?;
        match client.push(&mut lesson).await {
            Ok(report) => tracing::info!(command = "sync", ?report, "Lesson pushed"),
            Err(SyncError::CancelledByUser) => {
                tracing::warn!(command = "sync", "Cancelled by user; exiting");
                drop(lesson);
                std::process::exit(130);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✨ Sync complete! ✨\n");
    Ok(())
}
