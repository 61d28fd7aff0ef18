//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! Services are generic over repository traits, but AppState pins them to
//! the concrete infra implementations.

use std::sync::Arc;

use secrecy::SecretString;

use charla_core::chat::service::ConversationService;
use charla_core::prompt::CharacterRegistry;
use charla_infra::config::{load_config, resolve_data_dir};
use charla_infra::llm::ChatCompletionClient;
use charla_infra::sqlite::conversation::SqliteConversationRepository;
use charla_infra::sqlite::pool::DatabasePool;
use charla_infra::sqlite::user::SqliteUserRepository;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteConversationService = ConversationService<SqliteConversationRepository>;

/// Environment variable holding the upstream API key.
pub const UPSTREAM_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub conversation_service: Arc<ConcreteConversationService>,
    pub user_repo: Arc<SqliteUserRepository>,
    pub characters: Arc<CharacterRegistry>,
    pub upstream: Arc<ChatCompletionClient>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, load config, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        // Initialize database
        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("charla.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        // Load config and build the character registry
        let config = load_config(&data_dir).await;
        let characters = CharacterRegistry::new(config.characters.clone());

        // The upstream API key is optional at startup: without it the server
        // runs, and streaming endpoints report a configuration error.
        let api_key = std::env::var(UPSTREAM_API_KEY_ENV)
            .ok()
            .map(SecretString::from);
        if api_key.is_none() {
            tracing::warn!(
                "{UPSTREAM_API_KEY_ENV} is not set; streamed exchanges will fail with a configuration error"
            );
        }
        let upstream = ChatCompletionClient::new(&config.upstream, api_key)?;

        // Wire conversation service with its repository
        let conversation_service =
            ConversationService::new(SqliteConversationRepository::new(db_pool.clone()));
        let user_repo = SqliteUserRepository::new(db_pool.clone());

        Ok(Self {
            conversation_service: Arc::new(conversation_service),
            user_repo: Arc::new(user_repo),
            characters: Arc::new(characters),
            upstream: Arc::new(upstream),
            db_pool,
        })
    }
}
