#![allow(dead_code)]

use std::sync::Arc;

use echoed::{
    app_state::AppState,
    config::Config,
    domains::{echo::Echo, user::UserProfile},
    infrastructure::{SqliteDatabase, ViewerContext},
};

pub struct TestApp {
    pub db: Arc<SqliteDatabase>,
    pub state: AppState,
}

/// Fresh in-memory store with every service wired over it
pub async fn setup() -> TestApp {
    setup_with_config(Config::default()).await
}

pub async fn setup_with_config(config: Config) -> TestApp {
    let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
    let state = AppState::with_database(config, db.clone());
    TestApp { db, state }
}

impl TestApp {
    pub async fn user(&self, username: &str) -> UserProfile {
        self.state
            .users
            .create_user(username, "Test", "User")
            .await
            .unwrap()
    }

    pub async fn profile(&self, user: &UserProfile) -> UserProfile {
        self.state.users.get_profile(user.id).await.unwrap()
    }

    pub async fn echo(&self, author: &UserProfile, title: &str) -> Echo {
        self.state
            .echoes
            .create_echo(&viewer(author), title, "body")
            .await
            .unwrap()
    }
}

pub fn viewer(user: &UserProfile) -> ViewerContext {
    ViewerContext::authenticated(user.id, format!("test-{}", user.id))
}

pub fn anonymous() -> ViewerContext {
    ViewerContext::anonymous("test-anonymous".to_string())
}
