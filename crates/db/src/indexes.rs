use mongodb::{options::IndexOptions, Database, IndexModel};
use tracing::info;

use crate::models::EvaluationJob;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Evaluation jobs: the worker's claim query scans status + seq; seq is
    // unique to make the FIFO order unambiguous.
    create_indexes(
        db,
        EvaluationJob::COLLECTION,
        vec![
            index(bson::doc! { "status": 1, "seq": 1 }),
            index_unique(bson::doc! { "seq": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    let coll = db.collection::<bson::Document>(collection);
    coll.create_indexes(indexes).await?;
    info!(collection, "Indexes created");
    Ok(())
}
