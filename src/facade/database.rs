use async_trait::async_trait;
use serde_json::Value;

use crate::connection::auth::Credentials;
use crate::connection::config::ConnectionConfig;
use crate::connection::{Connection, Transport};
use crate::core::{Bindings, Result};
use crate::interface::Database;
use crate::result;

/// The data layer's public face: a live, signed-in connection exposed
/// through the [`Database`] contract.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use flexstore::{bindings, ConnectionConfig, Database, Datastore, MockTransport};
///
/// let config = ConnectionConfig::new("localhost:8000", "root", "secret")
///     .namespace("prod")
///     .database("guilds");
/// let db = Datastore::connect(Box::new(MockTransport::new()), &config).await.unwrap();
///
/// db.execute("DELETE vote WHERE event = $event", bindings! { "event" => "event:1" })
///     .await
///     .unwrap();
/// # });
/// ```
pub struct Datastore {
    connection: Connection,
}

impl Datastore {
    /// Establish a connection: sign in, then select namespace/database.
    pub async fn connect(transport: Box<dyn Transport>, config: &ConnectionConfig) -> Result<Self> {
        let connection = Connection::new(transport, config.query_timeout);
        connection
            .signin(&Credentials::root(&config.username, &config.password))
            .await?;
        connection
            .use_ns(&config.namespace, &config.database)
            .await?;
        tracing::debug!(endpoint = %config.endpoint, "datastore connected");
        Ok(Self { connection })
    }

    /// Wrap an already-established connection.
    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Server version string.
    pub async fn version(&self) -> Result<String> {
        self.connection.version().await
    }

    /// Close the underlying connection. Subsequent calls fail.
    pub fn close(&self) {
        self.connection.close();
    }
}

#[async_trait]
impl Database for Datastore {
    async fn query(&self, query: &str, bindings: Bindings) -> Result<Vec<Value>> {
        let envelopes = self.connection.query(query, &bindings).await?;
        result::query(envelopes)
    }

    async fn query_one(&self, query: &str, bindings: Bindings) -> Result<Value> {
        let envelopes = self.connection.query(query, &bindings).await?;
        result::query_one(envelopes)
    }

    async fn execute(&self, query: &str, bindings: Bindings) -> Result<()> {
        let envelopes = self.connection.query(query, &bindings).await?;
        result::execute(envelopes)
    }

    async fn ping(&self) -> Result<()> {
        self.connection.ping().await
    }
}
