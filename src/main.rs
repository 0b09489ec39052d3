use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use snafu::ResultExt;

use highlights::database::Database;
use highlights::error::{ApplicationError, ConnectDatabaseSnafu, IngestSnafu};
use highlights::{api, config, ingest, logger};

#[derive(Debug, Parser)]
#[command(version, about = "Collects NBA highlight videos and serves them to the dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single ingestion pass and exit
    Ingest,
    /// Run ingestion on every INGEST_INTERVAL boundary
    Watch,
    /// Serve stored highlights over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let cli = Cli::parse();
    let config = config::load()?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.database())
        .await
        .context(ConnectDatabaseSnafu)?;

    match cli.command {
        Command::Ingest => {
            ingest::run_once(&config, &database)
                .await
                .context(IngestSnafu)?;
        }
        Command::Watch => ingest::watch(&config, &database)
            .await
            .context(IngestSnafu)?,
        Command::Serve => api::serve(config.host_address, database).await?,
    }

    Ok(())
}
