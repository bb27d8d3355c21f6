pub mod hire_requests;
pub mod payments;
pub mod reviews;
pub mod users;
pub mod verifications;

#[cfg(test)]
pub mod memory;

pub use hire_requests::{HireRequestFilter, HireRequestRepository, MongoHireRequests};
pub use payments::{BadgePaymentRepository, MongoBadgePayments};
pub use reviews::{MongoReviews, ReviewRepository};
pub use users::{MongoUsers, UserRepository};
pub use verifications::{Decision, MongoVerifications, VerificationRepository};

use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use rocket::fairing::AdHoc;

use crate::state::AppState;

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok(database) => {
                info!("✓ MongoDB connected successfully");
                if let Err(e) = ensure_indexes(&database).await {
                    warn!("Failed to create MongoDB indexes: {}", e);
                }
                Ok(rocket.manage(AppState::from_database(&database)))
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                Err(rocket)
            }
        }
    })
}

async fn connect() -> Result<Database, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1}, None)
        .await?;

    Ok(client.database(&crate::config::Config::mongodb_database()))
}

async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let unique = || IndexOptions::builder().unique(true).build();

    db.collection::<mongodb::bson::Document>(hire_requests::COLLECTION)
        .create_indexes(
            [
                IndexModel::builder()
                    .keys(doc! { "provider_id": 1, "created_at": -1 })
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "client_id": 1, "created_at": -1 })
                    .build(),
            ],
            None,
        )
        .await?;

    db.collection::<mongodb::bson::Document>(reviews::COLLECTION)
        .create_indexes(
            [
                IndexModel::builder()
                    .keys(doc! { "service_id": 1 })
                    .options(unique())
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "provider_id": 1, "created_at": -1 })
                    .build(),
            ],
            None,
        )
        .await?;

    db.collection::<mongodb::bson::Document>(payments::COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "tx_ref": 1 })
                .options(unique())
                .build(),
            None,
        )
        .await?;

    db.collection::<mongodb::bson::Document>(verifications::COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "status": 1 })
                .build(),
            None,
        )
        .await?;

    Ok(())
}
