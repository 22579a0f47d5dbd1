use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, JwtConfig};
use crate::db;
use crate::users::{
    events::ChannelPublisher, memory::MemoryUserRepository, postgres::PgUserRepository,
    repo::UserRepository, services::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let repo: Arc<dyn UserRepository> = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url).await?;
                db::migrate(&pool).await;
                info!("using postgres user store");
                Arc::new(PgUserRepository::new(pool))
            }
            None => {
                info!("DATABASE_URL not set; using in-memory user store");
                Arc::new(MemoryUserRepository::new())
            }
        };

        let (publisher, _consumer) = ChannelPublisher::with_log_consumer();
        let users = UserService::new(repo, Arc::new(publisher));

        Ok(Self { users, config })
    }

    pub fn from_parts(users: UserService, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// In-memory state for tests; registration events go nowhere.
    pub fn fake() -> Self {
        let (publisher, _rx) = ChannelPublisher::new();
        let users = UserService::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(publisher),
        );
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(users, config)
    }
}
