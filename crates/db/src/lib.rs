pub mod indexes;
pub mod models;

use mongodb::{Client, Database};
use tracing::info;

use lectio_config::DatabaseSettings;

/// Connects to MongoDB and returns a handle to the configured database.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&settings.uri).await?;
    let db = client.database(&settings.name);
    info!(db = %settings.name, "Connected to MongoDB");
    Ok(db)
}
