use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{cache::PopularCache, config::Config};

pub struct AppState {
    pub db: DatabaseConnection,
    pub cache: Arc<dyn PopularCache>,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, cache: Arc<dyn PopularCache>, config: Config) -> Arc<Self> {
        Arc::new(Self { db, cache, config })
    }
}
