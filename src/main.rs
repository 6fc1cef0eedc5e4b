use clap::Parser;
use miette::{IntoDiagnostic, Result};
use remitgw::application::orchestrator::RemitCore;
use remitgw::application::registry::AdapterRegistry;
use remitgw::config::Config;
use remitgw::domain::history::HistoryFilter;
use remitgw::domain::ports::{HistoryStore, SharedHistoryStore};
use remitgw::infrastructure::in_memory::InMemoryHistoryStore;
use remitgw::interfaces::csv::history_writer::HistoryWriter;
use remitgw::interfaces::csv::request_reader::RequestReader;
use remitgw::interfaces::replay::Replayer;
use remitgw::telemetry;
use std::fs::File;
use std::io;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    telemetry::init(&config.log_level);

    let store = open_store(&config)?;
    let registry = AdapterRegistry::with_gateway(Arc::new(config.sandbox_gateway()));
    let mut replayer = Replayer::new(RemitCore::new(Arc::new(registry), store.clone()));

    // Replay requests
    let file = File::open(&config.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    for (line, request) in reader.requests().enumerate() {
        match request {
            Ok(request) => {
                if let Err(e) = replayer.apply(&request).await {
                    tracing::error!(
                        line = line + 1,
                        order = %request.dsa_order_id,
                        "Error processing request: {e}"
                    );
                }
            }
            Err(e) => {
                tracing::error!(line = line + 1, "Error reading request: {e}");
            }
        }
    }

    // Output the recorded history
    let page = store
        .list_remit_history(&HistoryFilter::default())
        .await
        .into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = HistoryWriter::new(stdout.lock());
    writer.write_history(&page.rows).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(config: &Config) -> Result<SharedHistoryStore> {
    use remitgw::infrastructure::rocksdb::RocksDbHistoryStore;

    match &config.db_path {
        Some(path) => Ok(Arc::new(RocksDbHistoryStore::open(path).into_diagnostic()?)),
        None => Ok(Arc::new(InMemoryHistoryStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(config: &Config) -> Result<SharedHistoryStore> {
    if config.db_path.is_some() {
        tracing::warn!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryHistoryStore::new()))
}
