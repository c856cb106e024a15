pub mod api;
pub mod config;
pub mod db;
pub mod review;
pub mod utils;

pub use db::DbPool;

use std::sync::Arc;

use config::Config;
use review::{ReviewPolicy, StepLadderPolicy};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub review: Arc<dyn ReviewPolicy>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let review = Arc::new(StepLadderPolicy::from_config(&config.review));
        Self { config, db, review }
    }
}
