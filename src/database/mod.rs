use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("clubhub");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the service relies on. The unique indexes are the
    /// real enforcement behind the friendly duplicate checks in the services:
    /// two racing signups cannot both insert the same handle or email.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = IndexOptions::builder().unique(true).build();

        let users = self
            .database()
            .collection::<mongodb::bson::Document>("users");

        let handle_index = IndexModel::builder()
            .keys(doc! { "handle": 1 })
            .options(unique.clone())
            .build();

        match users.create_index(handle_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(handle) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique.clone())
            .build();

        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let clubs = self
            .database()
            .collection::<mongodb::bson::Document>("clubs");

        let club_name_index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(unique)
            .build();

        match clubs.create_index(club_name_index).await {
            Ok(_) => log::info!("   ✅ Index created: clubs(name) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Per-club listings: discussions and problems are read newest-first,
        // the leaderboard by points descending.
        let discussions = self
            .database()
            .collection::<mongodb::bson::Document>("discussions");

        let discussions_index = IndexModel::builder()
            .keys(doc! { "clubId": 1, "createdAt": -1 })
            .build();

        match discussions.create_index(discussions_index).await {
            Ok(_) => log::info!("   ✅ Index created: discussions(clubId, createdAt)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let problems = self
            .database()
            .collection::<mongodb::bson::Document>("problems");

        let problems_index = IndexModel::builder()
            .keys(doc! { "clubId": 1, "createdAt": -1 })
            .build();

        match problems.create_index(problems_index).await {
            Ok(_) => log::info!("   ✅ Index created: problems(clubId, createdAt)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let leaderboard = self
            .database()
            .collection::<mongodb::bson::Document>("leaderboard");

        let leaderboard_index = IndexModel::builder()
            .keys(doc! { "clubId": 1, "points": -1 })
            .build();

        match leaderboard.create_index(leaderboard_index).await {
            Ok(_) => log::info!("   ✅ Index created: leaderboard(clubId, points)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_connection_and_indexes() {
        dotenv::dotenv().ok();

        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017/clubhub".to_string());
        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
    }
}
