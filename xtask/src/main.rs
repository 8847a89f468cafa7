use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dwgpt_core::backend::{BackendDriver, BackendKind, MockBackend};
use dwgpt_core::export::export_as_delimited_text;
use dwgpt_core::protocol::{ChatReply, Payload, RecordSet};
use dwgpt_core::state::ChatSession;
use dwgpt_core::telemetry;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Automation helpers for DW-GPT")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a round trip against the mock backend and export its records.
    Smoke,
}

fn main() -> Result<()> {
    telemetry::init_tracing(EnvFilter::new("info"))?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke => smoke_test(),
    }
}

fn smoke_test() -> Result<()> {
    let runtime = Runtime::new()?;
    let temp_dir = TempDir::new()?;

    let mock = Arc::new(MockBackend::new());
    let records = vec![json!({ "shipment_no": "SMOKE1", "pol": "Nhava Sheva, IN" })]
        .into_iter()
        .filter_map(|value| value.as_object().cloned())
        .collect();
    mock.push_reply(
        ChatReply::with_payload(Payload::Shipments(RecordSet::new(records)))
            .with_conversation_id("smoke"),
    );
    let session = ChatSession::new(BackendDriver::new(BackendKind::Mock, mock));

    let reply = runtime.block_on(session.send("ping from xtask"))?;
    let Some(records) = reply.records() else {
        bail!("smoke reply carried no records: {}", reply.content);
    };
    let export = export_as_delimited_text(records).context("nothing to export")?;
    let path = export.write_to(temp_dir.path())?;

    info!(
        "messages" = session.messages().len(),
        "export" = %path.display(),
        "smoke test round trip exported"
    );
    Ok(())
}
