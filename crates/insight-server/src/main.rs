//! Command-line interface for insight-rs
//!
//! ```bash
//! # Serve the HTTP API (reads .env if present)
//! export GOOGLE_API_KEY="..."
//! insight serve --bind 0.0.0.0:8000
//!
//! # Run one research request and print the result as JSON
//! insight research --company トヨタ自動車 --department 情報システム部 --position 部長
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use insight_research::PipelineRequest;
use insight_server::AppState;
use insight_utils::{Config, EnvLookup, init_tracing_with, load_env_file};
use std::net::SocketAddr;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "insight")]
#[command(about = "Customer research agent: securities report summaries, hypotheses and hearing items", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,
    },

    /// Research one company and print the result
    Research {
        /// Company name as registered in the company code table
        #[arg(long)]
        company: String,

        #[arg(long, default_value = "")]
        department: String,

        #[arg(long, default_value = "")]
        position: String,

        #[arg(long, default_value = "")]
        job_scope: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file();

    let env = EnvLookup::process();
    let config = Config::from_lookup(&env)?;
    init_tracing_with(config.log_format);

    if let Some(path) = env_file {
        info!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();
    let state = AppState::from_lookup(&env)?;

    match cli.command {
        Command::Serve { bind } => {
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            info!(app = %config.app_name, env = %config.environment, %bind, "starting server");
            insight_server::serve(listener, state).await?;
        }
        Command::Research {
            company,
            department,
            position,
            job_scope,
        } => {
            let request =
                PipelineRequest::new(company).with_persona(department, position, job_scope);
            let result = state.pipeline.run(&request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
