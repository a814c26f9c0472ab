use std::sync::Arc;

use clap::Parser;
use poem::{Server, listener::TcpListener};

use rootsreach_backend::api;
use rootsreach_backend::app_data::AppData;
use rootsreach_backend::cli::{self, Cli, Commands};
use rootsreach_backend::config::{BootstrapSettings, DatabaseConnections, init_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_logging()?;

    let settings = BootstrapSettings::from_env()?;

    let command = cli.command();
    if command == Commands::Migrate {
        return cli::migrate::run_migrations(&settings).await;
    }

    let connections = DatabaseConnections::connect(&settings).await?;
    connections.migrate().await?;

    let app_data = Arc::new(AppData::init(connections).await?);

    match command {
        Commands::Serve => serve(app_data, &settings).await?,
        other => cli::execute_command(other, app_data).await?,
    }

    Ok(())
}

async fn serve(app_data: Arc<AppData>, settings: &BootstrapSettings) -> Result<(), std::io::Error> {
    let address = settings.server_address();
    let app = api::build_routes(app_data, &format!("http://{}/api", address));

    tracing::info!("Starting server on http://{}", address);
    tracing::info!("Swagger UI available at http://{}/swagger", address);

    Server::new(TcpListener::bind(address)).run(app).await
}
