mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::{db::DBClient, memory::MemoryStore, store::Store};
use service::{
    booking_service::BookingService,
    chat_service::ChatService,
    directory_service::DirectoryService,
    gateway::{PaymentGateway, SimulatedGateway},
    locks::EntityLocks,
    notification_service::NotificationService,
    party_service::PartyService,
    payment_service::PaymentService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub store: Arc<dyn Store>,
    pub party_service: Arc<PartyService>,
    pub directory_service: Arc<DirectoryService>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
    pub chat_service: Arc<ChatService>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let locks = Arc::new(EntityLocks::new());

        let notification_service = Arc::new(NotificationService::new(store.clone()));
        let party_service = Arc::new(PartyService::new(store.clone()));
        let directory_service = Arc::new(DirectoryService::new(store.clone()));
        let booking_service = Arc::new(BookingService::new(
            store.clone(),
            notification_service.clone(),
            locks.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            store.clone(),
            booking_service.clone(),
            notification_service.clone(),
            gateway,
            locks,
        ));
        let chat_service = Arc::new(ChatService::new(store.clone(), notification_service.clone()));

        Self {
            env: config,
            store,
            party_service,
            directory_service,
            booking_service,
            payment_service,
            chat_service,
            notification_service,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::DEBUG))
        .init();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            let pool = match PgPoolOptions::new()
                .max_connections(20)
                .min_connections(2)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    tracing::info!("✅ Connection to the database is successful!");
                    pool
                }
                Err(err) => {
                    tracing::error!("🔥 Failed to connect to the database: {:?}", err);
                    std::process::exit(1);
                }
            };

            if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
                tracing::error!("🔥 Failed to run migrations: {}", err);
                std::process::exit(1);
            }

            let db_client = match &config.redis_url {
                Some(redis_url) => DBClient::with_redis(pool, redis_url).await,
                None => {
                    tracing::info!("Redis not configured - running without cache (set REDIS_URL to enable)");
                    DBClient::new(pool)
                }
            };
            tracing::info!("📊 Cache status: {}", db_client.cache_status());

            Arc::new(db_client)
        }
        None => {
            tracing::warn!("DATABASE_URL not set - using the in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let gateway: Arc<dyn PaymentGateway> = Arc::new(SimulatedGateway::from_config(&config));

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = Arc::new(AppState::new(config.clone(), store, gateway));

    let app = create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
