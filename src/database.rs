use snafu::{Location, ResultExt as _, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::instrument;

use crate::config::DatabaseConfig;

/// Helper for executing arbitrary SurrealQL queries.
pub mod query;

/// Table definitions.
pub mod schema;

mod highlight;

pub use highlight::HighlightFilter;
pub use query::Query;

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseError {
    #[snafu(display("cannot connect to the database `{url}` at {location}: {source}"))]
    DatabaseConnection {
        url: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot select `{namespace}/{database}` at {location}: {source}"))]
    SelectDatabase {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot define the schema at {location}: {source}"))]
    DefineSchema {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to query the database at {location}: {source}"))]
    DatabaseQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to deserialize the database response at {location}: {source}"))]
    DatabaseDeserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("upsert of {count} highlights was rolled back at {location}: {source}"))]
    UpsertRolledBack {
        count: usize,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Owns the storage handle. Dropping the last clone closes the connection.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    /// Connects, signs in when credentials are configured, selects the namespace and
    /// database, and makes sure the schema exists.
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let database = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .context(DatabaseConnectionSnafu {
                url: config.url.as_str(),
            })?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            database
                .signin(Root { username, password })
                .await
                .context(DatabaseConnectionSnafu {
                    url: config.url.as_str(),
                })?;
        }

        database
            .use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .context(SelectDatabaseSnafu {
                namespace: config.namespace.as_str(),
                database: config.database.as_str(),
            })?;

        let database = Database { database };
        database.define_schema().await?;

        tracing::info!(url = %config.url, "connected to the database");
        Ok(database)
    }

    /// Create a builder to execute arbitrary SQL code on the database.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let popular: Vec<HighlightRecord> = db
    ///     .sql("SELECT * FROM highlights WHERE views >= $views")
    ///     .bind(("views", 1_000_000))
    ///     .fetch()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: &str) -> Query<'_> {
        Query::new(self.database.query(query))
    }
}
