use std::net::SocketAddr;

use snafu::{Location, Snafu};

use crate::database::DatabaseError;
use crate::ingest::IngestError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApplicationError {
    /// could not parse the configuration from the environment
    #[snafu(display("could not load the configuration: {source}"))]
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    #[snafu(display("could not initialize the logger: {source}"))]
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not connect to the database: {source}"))]
    ConnectDatabase {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// An ingestion run failed as a whole
    #[snafu(display("ingestion run failed: {source}"))]
    Ingest {
        source: IngestError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    #[snafu(display("could not bind to {address}: {source}"))]
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not serve the application
    #[snafu(display("the query server stopped: {source}"))]
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}
