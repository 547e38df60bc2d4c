use cucumber::given;
use log::*;
use souq_engine::SqliteDatabase;

use crate::cucumber::{
    ledger_world::{MarketplaceSystem, StubGateway},
    LedgerWorld,
};

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut LedgerWorld) {
    let url = format!("sqlite://{}/souq_bdd_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Created database: {url}");
    world.system = Some(MarketplaceSystem { db_path: url, db, gateway: StubGateway::default() });
}
