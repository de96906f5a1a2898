use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use apalis::{
    layers::{retry::RetryPolicy, sentry::SentryLayer},
    prelude::*,
};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand};
use cron::Schedule;
use digest_datastore::{DataStore, PgDataStore, SummaryView};
use digest_pulse::{
    anthropic::AnthropicClient,
    config::{DEFAULT_MAX_RESULTS, DEFAULT_TRANSCRIPT_LANGUAGE},
    secrets::{EnvSecrets, FileSecrets, SecretProvider},
    tracing::init_tracing_subscriber,
    yt::{data_api::YouTubeDataApi, transcript::YtTranscriptFetcher},
    ExecutionMode, IngestionPipelineBuilder, PipelineConfig, PipelineError,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "digest-pulse",
    about = "Summarizes the newest videos of a YouTube channel"
)]
struct Cli {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Channel to monitor
    #[arg(long, env = "CHANNEL_ID")]
    channel_id: String,

    /// Allow live transcript fetches (interactive runs only)
    #[arg(long, env = "LOCAL_RUN")]
    local: bool,

    /// Read secrets from files in this directory instead of the environment
    #[arg(long, env = "SECRETS_DIR")]
    secrets_dir: Option<PathBuf>,

    /// Name of the YouTube Data API key secret
    #[arg(long, default_value = "YOUTUBE_API_KEY")]
    youtube_api_secret: String,

    /// Name of the Anthropic API key secret
    #[arg(long, default_value = "ANTHROPIC_API_KEY")]
    llm_api_secret: String,

    /// Override the summarization model
    #[arg(long, env = "LLM_MODEL")]
    llm_model: Option<String>,

    /// Maximum videos to consider per run
    #[arg(long, env = "MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Skip videos with fewer views
    #[arg(long, env = "MIN_VIEW_COUNT", default_value_t = 0)]
    min_view_count: u64,

    /// Skip videos with fewer likes
    #[arg(long, env = "MIN_LIKE_COUNT", default_value_t = 0)]
    min_like_count: u64,

    /// Preferred caption language
    #[arg(long, env = "TRANSCRIPT_LANGUAGE", default_value = DEFAULT_TRANSCRIPT_LANGUAGE)]
    transcript_language: String,

    /// Pause after each live transcript fetch, in seconds
    #[arg(long, env = "FETCH_DELAY_SECS", default_value_t = 3)]
    fetch_delay_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and exit
    Run {
        /// Cancel the run after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 */6 * * *")]
        schedule: String,
    },
    /// Print the most recent stored summaries as JSON
    Summaries {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Clone)]
struct Config {
    db_url: String,
    youtube_api_key: String,
    llm_api_key: String,
    llm_model: Option<String>,
    pipeline: PipelineConfig,
}

struct Secrets {
    youtube_api_key: String,
    llm_api_key: String,
}

async fn resolve_secrets<P: SecretProvider>(provider: &P, cli: &Cli) -> anyhow::Result<Secrets> {
    let youtube_api_key = provider
        .get_secret(&cli.youtube_api_secret)
        .await
        .context("Failed to resolve YouTube API key")?;
    let llm_api_key = provider
        .get_secret(&cli.llm_api_secret)
        .await
        .context("Failed to resolve LLM API key")?;

    Ok(Secrets {
        youtube_api_key,
        llm_api_key,
    })
}

/// Resolves secrets and validates the pipeline settings for a run.
async fn load_config(cli: &Cli, mode: ExecutionMode) -> anyhow::Result<Config> {
    let secrets = match &cli.secrets_dir {
        Some(dir) => resolve_secrets(&FileSecrets::new(dir), cli).await?,
        None => resolve_secrets(&EnvSecrets, cli).await?,
    };

    let pipeline = PipelineConfig::new(&cli.channel_id)
        .execution_mode(mode)
        .max_results(cli.max_results)
        .fetch_delay(Duration::from_secs(cli.fetch_delay_secs))
        .transcript_language(&cli.transcript_language)
        .min_counts(cli.min_view_count, cli.min_like_count)
        .validate()?;

    Ok(Config {
        db_url: cli.database_url.clone(),
        youtube_api_key: secrets.youtube_api_key,
        llm_api_key: secrets.llm_api_key,
        llm_model: cli.llm_model.clone(),
        pipeline,
    })
}

async fn run_pipeline(config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let store = PgDataStore::init(&config.db_url).await?;

    let mut summarizer = AnthropicClient::new(&config.llm_api_key);
    if let Some(model) = &config.llm_model {
        summarizer = summarizer.with_model(model);
    }

    let pipeline = IngestionPipelineBuilder::new(config.pipeline.clone())
        .store(store)
        .video_source(YouTubeDataApi::new(&config.youtube_api_key))
        .transcript_fetcher(YtTranscriptFetcher::new(
            &config.pipeline.transcript_language,
        ))
        .summarizer(summarizer)
        .build();

    match pipeline.run(cancel).await {
        Ok(stats) => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Err(e @ PipelineError::Cancelled { .. }) => {
            if let Some(stats) = e.partial_stats() {
                println!("{}", serde_json::to_string_pretty(stats)?);
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Cancels `token` on Ctrl-C or once `deadline` elapses.
fn cancel_on_signal(token: CancellationToken, deadline: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::warn!("Interrupted, cancelling run"),
            _ = deadline => tracing::warn!("Deadline reached, cancelling run"),
        }
        token.cancel();
    });
}

async fn print_summaries(db_url: &str, channel_id: &str, limit: usize) -> anyhow::Result<()> {
    let store = PgDataStore::init(db_url).await?;

    let summaries = store
        .list_recent(channel_id, limit)
        .await?
        .iter()
        .map(SummaryView::from)
        .collect::<Vec<_>>();

    let body = serde_json::json!({
        "channelId": channel_id,
        "count": summaries.len(),
        "summaries": summaries,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(
        channel_id = %config.pipeline.channel_id,
        "Running scheduled pipeline..."
    );
    run_pipeline(&config, CancellationToken::new()).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    match &cli.command {
        Command::Run { deadline_secs } => {
            let config = load_config(&cli, ExecutionMode::from_local_flag(cli.local)).await?;
            tracing::info!(
                channel_id = %config.pipeline.channel_id,
                mode = ?config.pipeline.execution_mode,
                "Running pipeline once..."
            );
            let cancel = CancellationToken::new();
            cancel_on_signal(cancel.clone(), deadline_secs.map(Duration::from_secs));
            run_pipeline(&config, cancel).await?;
        }
        Command::Cron { schedule } => {
            // scheduled runs never scrape transcripts themselves
            let config = load_config(&cli, ExecutionMode::Unattended).await?;

            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(schedule)?;

            let worker = WorkerBuilder::new("digest-pulse-cron")
                .backend(CronStream::new(schedule))
                .retry(RetryPolicy::retries(3))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
        Command::Summaries { limit } => {
            print_summaries(&cli.database_url, &cli.channel_id, *limit).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        let base = [
            "digest-pulse",
            "--database-url",
            "postgres://localhost/digest",
            "--channel-id",
            "UC123",
        ];
        Cli::try_parse_from(base.iter().chain(args)).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_summaries_subcommand_parses() {
        let cli = parse(&["summaries", "--limit", "5"]);
        assert!(matches!(cli.command, Command::Summaries { limit: 5 }));
    }

    #[tokio::test]
    async fn test_load_config_reads_file_secrets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("YOUTUBE_API_KEY"), "yt-key\n").unwrap();
        std::fs::write(dir.path().join("ANTHROPIC_API_KEY"), "llm-key\n").unwrap();

        let secrets_dir = dir.path().to_string_lossy().into_owned();
        let cli = parse(&["--local", "--secrets-dir", &secrets_dir, "--max-results", "80", "cron"]);
        let config = load_config(&cli, ExecutionMode::Unattended).await.unwrap();

        assert_eq!(config.youtube_api_key, "yt-key");
        assert_eq!(config.llm_api_key, "llm-key");
        assert_eq!(config.pipeline.execution_mode, ExecutionMode::Unattended);
        assert_eq!(config.pipeline.max_results, 50);
    }

    #[tokio::test]
    async fn test_load_config_fails_without_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let secrets_dir = dir.path().to_string_lossy().into_owned();
        let cli = parse(&["--secrets-dir", &secrets_dir, "run"]);

        assert!(load_config(&cli, ExecutionMode::Local).await.is_err());
    }
}
