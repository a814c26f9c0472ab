use crate::config::{BootstrapSettings, DatabaseConnections};

/// Run database migrations for auth and audit databases
///
/// Connects to both databases without initializing the full AppData structure.
pub async fn run_migrations(settings: &BootstrapSettings) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Running database migrations...");

    let connections = DatabaseConnections::connect(settings).await?;
    connections.migrate().await?;

    tracing::info!("All migrations completed successfully");

    Ok(())
}
