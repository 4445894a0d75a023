//! Shared helpers for the integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use lectio_api::state::AppState;
use lectio_services::dao::EvaluationJobDao;
use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::{Client, Database};

/// URI of the MongoDB the `#[ignore]`d tests talk to.
pub fn test_mongo_uri() -> String {
    std::env::var("LECTIO_TEST_MONGO_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

/// A uniquely named throwaway database; callers drop it when done.
pub async fn test_database() -> Database {
    let client = Client::with_uri_str(test_mongo_uri())
        .await
        .expect("mongo client");
    client.database(&format!("lectio_test_{}", uuid::Uuid::new_v4().simple()))
}

/// The driver connects lazily, so building a handle performs no I/O.
/// Handlers that reject a request before touching the DAO can be exercised
/// against this without any MongoDB running.
pub fn lazy_database() -> Database {
    let options = ClientOptions::builder()
        .hosts(vec![ServerAddress::Tcp {
            host: "localhost".to_string(),
            port: Some(27017),
        }])
        .build();
    Client::with_options(options)
        .expect("client options")
        .database("lectio_test_unreachable")
}

pub fn lazy_state(upload_dir: PathBuf) -> AppState {
    AppState {
        jobs: Arc::new(EvaluationJobDao::new(&lazy_database())),
        upload_dir,
    }
}
