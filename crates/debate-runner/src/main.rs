use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arena::{DebateOrchestrator, LanguageModelClient};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use debate_runner::client::check_endpoint;
use debate_runner::config::{CliOverrides, RunnerConfig};
use debate_runner::report::{score_table, ConsolePrinter};
use debate_runner::{build_client, dry_run_client};

/// Run a structured debate between two LLM advocates.
#[derive(Parser, Debug)]
#[command(name = "debate-runner", version, about)]
struct Cli {
    /// Question under debate.
    #[arg(long)]
    question: Option<String>,

    /// Answer defended by Advocate1.
    #[arg(long)]
    answer_a: Option<String>,

    /// Answer defended by Advocate2.
    #[arg(long)]
    answer_b: Option<String>,

    /// Number of rounds.
    #[arg(long)]
    rounds: Option<u32>,

    /// TOML configuration file.
    #[arg(long, env = "DEBATE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the outcome as JSON instead of the live transcript.
    #[arg(long)]
    json: bool,

    /// Use canned responses instead of calling the model.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            question: self.question.clone(),
            answer_a: self.answer_a.clone(),
            answer_b: self.answer_b.clone(),
            rounds: self.rounds,
            config_path: self.config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RunnerConfig::load(&cli.overrides()).context("Failed to load configuration")?;

    let client: Arc<dyn LanguageModelClient> = if cli.dry_run {
        info!(rounds = config.debate.round_count, "Dry run: using scripted responses");
        Arc::new(dry_run_client(config.debate.round_count))
    } else {
        info!(
            url = %config.llm.base_url,
            model = %config.llm.model,
            timeout_secs = config.llm.timeout.as_secs(),
            max_retries = config.llm.max_retries,
            "Using model endpoint"
        );
        if !check_endpoint(&config.llm.base_url).await {
            warn!(url = %config.llm.base_url, "Model endpoint did not answer /models; continuing");
        }
        build_client(&config.llm).context("Failed to build model client")?
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling debate");
            ctrl_c.cancel();
        }
    });

    let mut orchestrator = DebateOrchestrator::new(config.debate, client)
        .context("Invalid debate configuration")?
        .with_cancellation(cancel);
    if !cli.json {
        orchestrator = orchestrator.with_observer(Box::new(ConsolePrinter));
    }

    let outcome = match orchestrator.run().await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(status = %orchestrator.status_line(), "Debate stopped early");
            if !cli.json && !orchestrator.ledger().is_empty() {
                eprintln!("Scores so far: {}", orchestrator.ledger().render());
            }
            return Err(err).context("Debate did not finish");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?;
        println!("{json}");
    } else {
        print!("{}", score_table(&outcome));
    }
    info!(summary = %outcome.summary_line(), "Done");

    Ok(())
}
