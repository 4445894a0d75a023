use std::path::PathBuf;
use std::sync::Arc;

use lectio_services::dao::EvaluationJobDao;

/// Shared handler state. The HTTP layer only ever inserts and reads queue
/// rows; job mutation belongs to the worker alone.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<EvaluationJobDao>,
    pub upload_dir: PathBuf,
}
