mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod mentor;
mod models;
mod portfolio;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EvidenceBackend};
use crate::db::create_pool;
use crate::interview::machine::Interviewer;
use crate::interview::store::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::llm_client::gemini::GeminiClient;
use crate::llm_client::groq::GroqClient;
use crate::llm_client::{CompletionService, CredentialPool};
use crate::mentor::roadmap::RoadmapAdvisor;
use crate::mentor::CareerMentor;
use crate::portfolio::evidence::{EvidenceStore, LocalEvidenceStore, S3EvidenceStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scholar API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    // Interview sessions
    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Interview sessions stored in Redis");
            Arc::new(RedisSessionStore::new(client, config.session_ttl_secs))
        }
        None => {
            info!("REDIS_URL not set; interview sessions kept in memory");
            Arc::new(MemorySessionStore::default())
        }
    };

    // Evidence storage
    let evidence: Arc<dyn EvidenceStore> = match &config.evidence {
        EvidenceBackend::Local { dir } => {
            info!("Evidence stored under {}", dir.display());
            Arc::new(LocalEvidenceStore::new(dir.clone()))
        }
        EvidenceBackend::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let client = build_s3_client(endpoint, access_key_id, secret_access_key).await;
            info!("Evidence stored in S3 bucket {bucket}");
            Arc::new(S3EvidenceStore::new(client, bucket.clone()))
        }
    };

    // Completion providers
    let credentials = Arc::new(CredentialPool::new(config.groq_api_keys.clone())?);
    let groq: Arc<dyn CompletionService> = Arc::new(GroqClient::new(config.groq_base_url.clone())?);
    info!(
        "Groq client initialized (model: {}, {} credentials)",
        groq.model(),
        credentials.len()
    );
    let gemini: Arc<dyn CompletionService> =
        Arc::new(GeminiClient::new(config.gemini_base_url.clone())?);
    info!("Gemini client initialized (model: {})", gemini.model());

    let state = AppState {
        db,
        sessions,
        evidence,
        interviewer: Interviewer::new(groq.clone(), credentials.clone()),
        mentor: CareerMentor::new(groq, credentials),
        roadmap: RoadmapAdvisor::new(gemini, config.gemini_api_key.clone()),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the portal frontend has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "scholar-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
