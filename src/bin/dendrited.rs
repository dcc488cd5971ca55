//! Service entry point.
//!
//! `dendrited serve` binds the HTTP surface; `dendrited check-config`
//! validates the environment and registry without starting anything.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use dendrite::config::{load_registry, Settings};
use dendrite::http::{router, AppState};
use dendrite::service::ChangeService;
use dendrite::slack::{PermalinkSource, SlackApiPermalinks};
use dendrite::store::GraphStore;
use dendrite::telemetry;

#[derive(Parser)]
#[command(name = "dendrited", about = "Slack-driven knowledge-graph commit service")]
struct Cli {
    /// Path to the project registry JSON.
    #[arg(long, default_value = "config/projects.json")]
    registry: PathBuf,

    /// Increase log verbosity (-v info is the default, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON logs instead of the compact format.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate environment settings and the registry, then exit.
    CheckConfig,
    /// Run the HTTP service.
    Serve {
        /// Override the bind address from the environment.
        #[arg(long)]
        bind: Option<String>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> dendrite::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose.max(1), cli.json_logs);

    let settings = Settings::from_env()?;
    let registry = load_registry(&cli.registry)?;

    match cli.command {
        Command::CheckConfig => {
            println!(
                "ok: {} project(s), source channel {}",
                registry.projects.len(),
                registry.channel_id()
            );
            Ok(())
        }
        Command::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| settings.bind_addr.clone());

            let permalinks: Arc<dyn PermalinkSource> =
                Arc::new(SlackApiPermalinks::new(settings.slack_bot_token.clone())?);

            let store = Arc::new(GraphStore::new());
            let service = Arc::new(ChangeService::new(registry, store, permalinks));
            service.bootstrap();

            let state = AppState::new(service, settings.slack_signing_secret.as_str());
            let app = router(state);

            tracing::info!(%addr, app = %settings.app_name, env = %settings.environment, "serving");
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await
            })?;
            Ok(())
        }
    }
}
