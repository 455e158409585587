use std::sync::Arc;

use crate::{
    config::Config,
    domains::{
        comment::CommentService, echo::EchoService, social_graph::SocialGraphService,
        user::UserService,
    },
    error::AppResult,
    infrastructure::{
        database::{connect_database, DatabaseInterface},
        id_generator::IdGenerator,
        middleware::HasIdentityHeader,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub echoes: EchoService,
    pub comments: CommentService,
    pub social_graph: SocialGraphService,
    pub database: Arc<dyn DatabaseInterface>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database = connect_database(&config.database).await?;
        Ok(Self::with_database(config, database))
    }

    /// Wire the services over an already initialized store
    pub fn with_database(config: Config, database: Arc<dyn DatabaseInterface>) -> Self {
        let ids = Arc::new(IdGenerator::new(config.identity.id_shard));

        Self {
            users: UserService::new(database.clone(), ids.clone()),
            echoes: EchoService::new(database.clone(), ids.clone()),
            comments: CommentService::new(database.clone(), ids.clone(), config.limits.clone()),
            social_graph: SocialGraphService::new(database.clone(), ids, config.limits.clone()),
            database,
            config,
        }
    }
}

impl HasIdentityHeader for AppState {
    fn identity_header(&self) -> &str {
        &self.config.identity.header
    }
}
