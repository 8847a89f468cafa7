use clap::{Parser, Subcommand};
use dwgpt::{render_message, ChatRepl};
use dwgpt_core::backend::{BackendDriver, BackendKind};
use dwgpt_core::config::{parse_endpoint, ClientSettings};
use dwgpt_core::state::ChatSession;
use dwgpt_core::telemetry;
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "dwgpt", version, about = "Chat with the DW-GPT data assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Backend chat endpoint.
    #[arg(long)]
    endpoint: Option<String>,
    /// `http` or `mock`.
    #[arg(long)]
    provider: Option<String>,
    /// Directory CSV exports are written to.
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a single message and print the reply.
    Ask { message: String },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(telemetry::default_filter())?;

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let driver = BackendDriver::with_kind(settings.provider, &settings.endpoint)?;
    tracing::info!(
        endpoint = %settings.endpoint,
        provider = ?driver.kind(),
        "starting DW-GPT client"
    );
    let session = ChatSession::new(driver);
    let runtime = Runtime::new()?;

    match cli.command {
        Some(Command::Ask { message }) => {
            let reply = runtime.block_on(session.send(message))?;
            println!("{}", render_message(&reply));
        }
        None => {
            let repl = ChatRepl::new(session, settings.export_dir());
            runtime.block_on(repl.run())?;
        }
    }

    Ok(())
}

fn resolve_settings(cli: &Cli) -> anyhow::Result<ClientSettings> {
    let mut settings =
        ClientSettings::load().map_err(|err| anyhow::anyhow!(err.user_message()))?;
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint =
            parse_endpoint(endpoint).map_err(|err| anyhow::anyhow!(err.user_message()))?;
    }
    if let Some(provider) = &cli.provider {
        settings.provider = BackendKind::parse(provider)
            .ok_or_else(|| anyhow::anyhow!("unknown provider `{provider}`"))?;
    }
    if let Some(dir) = &cli.export_dir {
        settings.export_dir = Some(dir.clone());
    }
    Ok(settings)
}
