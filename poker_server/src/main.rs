use log::{error, info, warn};
use poker_server::{
    GameOrchestrator, InMemoryTableStore, RulesDirectory, ServerConfig, StandardEvaluator,
};
use std::sync::Arc;
use tokio::signal;

async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = signal::ctrl_c() => res?,
            _ = terminate.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env();
    let store = Arc::new(InMemoryTableStore::new());
    let rules_dir = RulesDirectory::new(&config.rules_dir);
    match store.load_rules_dir(&rules_dir) {
        Ok(count) => info!(
            "Loaded {} variants from {}",
            count,
            rules_dir.root().display()
        ),
        Err(e) => warn!("No variant rules loaded: {}", e),
    }

    let orchestrator = Arc::new(GameOrchestrator::new(
        store,
        Arc::new(StandardEvaluator::new()),
        config,
    ));
    info!(
        "Session orchestrator running, idle timeout {} minutes",
        orchestrator.config().idle_timeout_minutes
    );
    let cleanup_task = orchestrator.spawn_cleanup_task();

    if let Err(e) = wait_for_shutdown_signal().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received, closing sessions...");
    cleanup_task.abort();

    let tables: Vec<String> = orchestrator
        .get_all_sessions()
        .iter()
        .map(|s| s.lock().table_id().clone())
        .collect();
    for table_id in tables {
        orchestrator.remove_session(&table_id);
    }

    info!("Shutdown complete");
    Ok(())
}
