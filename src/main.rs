use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use shipment_aggregate as app;
use shipment_aggregate::events::{Event, ResponseEnvelope, ResponseSender};

/// Reads Shipment events as JSON lines on stdin and writes one response
/// envelope per handled event to stdout, backed by an in-memory collection.
#[derive(Parser)]
#[command(name = "shipment-aggregate", about = "Shipment aggregate event handler", version)]
struct Cli {
    #[arg(long, help = "Override the configured log level")]
    log_level: Option<String>,
    #[arg(long, action = ArgAction::SetTrue, help = "Emit logs as JSON")]
    json_logs: bool,
    #[arg(long, help = "Override the aggregate id this handler answers for")]
    aggregate_id: Option<i8>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = app::config::load_config().context("loading configuration")?;
    let level = cli.log_level.as_deref().unwrap_or(cfg.log_level());
    app::config::init_tracing(level, cli.json_logs || cfg.log_json);

    let aggregate_id = cli.aggregate_id.unwrap_or(cfg.aggregate_id);
    info!(
        aggregate_id,
        database = %cfg.database_name,
        collection = %cfg.collection_name,
        event_topic = %cfg.event_topic,
        response_topic = %cfg.response_topic,
        "starting shipment event handler"
    );

    let collection = Arc::new(app::db::InMemoryCollection::new());
    let handler = Arc::new(app::ShipmentEventHandler::with_aggregate_id(
        collection,
        aggregate_id,
    ));

    let (event_tx, event_rx) = mpsc::channel::<Event>(cfg.event_channel_capacity);
    let (response_tx, mut response_rx) =
        mpsc::channel::<ResponseEnvelope>(cfg.event_channel_capacity);

    let processor = tokio::spawn(app::events::process_events(
        event_rx,
        handler,
        ResponseSender::new(response_tx),
    ));

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(envelope) = response_rx.recv().await {
            let mut line = serde_json::to_vec(&envelope)?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0usize;
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(&line) {
            Ok(event) => {
                if event_tx.send(event).await.is_err() {
                    error!("event processor stopped early");
                    break;
                }
            }
            Err(e) => warn!(line = line_number, "skipping undecodable event: {}", e),
        }
    }
    drop(event_tx);

    processor.await.context("event processor panicked")?;
    writer.await.context("response writer panicked")??;

    info!("input exhausted, shutting down");
    Ok(())
}
