use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
    http::{Method, Request},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use tf_common::db::{create_pool_from_url_checked, MatchStore, MemoryStore, PgMatchStore};
use tf_common::logging::init_tracing_subscriber;
use tf_common::matching::{MatchingService, MatchingServiceConfig};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{cache, health, matches};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const MAX_BODY_BYTES: usize = 256 * 1024;
const MAX_RETRY_BACKOFF_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Seeded in-process store, no database needed
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "tf-api", about = "Developer matching API for talentflow projects")]
pub struct Cli {
    /// Snapshot store backing the matching service
    #[arg(long, env = "TF_STORE", value_enum, default_value = "postgres")]
    pub store: StoreKind,

    /// PostgreSQL connection string (required for --store postgres)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "TF_DB_POOL_SIZE", default_value_t = 16)]
    pub db_pool_size: usize,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "TF_CORS_ORIGINS", default_value = "http://localhost:3000")]
    pub cors_origins: String,

    /// Lifetime of a cached ranking; 0 disables the cache
    #[arg(long, env = "TF_MATCH_CACHE_TTL_MS", default_value_t = 3000)]
    pub match_cache_ttl_ms: u64,

    /// Pause before retrying a transient store failure
    #[arg(long, env = "TF_STORE_RETRY_BACKOFF_MS", default_value_t = 100)]
    pub store_retry_backoff_ms: u64,

    /// Prometheus exporter port; 0 disables the exporter
    #[arg(long, env = "TF_METRICS_PORT", default_value_t = 9100)]
    pub metrics_port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub db_pool_size: usize,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub matching: MatchingServiceConfig,
    pub metrics_port: Option<u16>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::Config(
                "TF_CORS_ORIGINS must list explicit origins".into(),
            ));
        }
        if let Some(bad) = cors_origins
            .iter()
            .find(|origin| origin.parse::<HeaderValue>().is_err())
        {
            return Err(ApiError::Config(format!("invalid CORS origin {bad:?}")));
        }

        let database_url = cli.database_url.filter(|url| !url.trim().is_empty());
        if cli.store == StoreKind::Postgres && database_url.is_none() {
            return Err(ApiError::Config(
                "DATABASE_URL is required when TF_STORE=postgres".into(),
            ));
        }
        if cli.db_pool_size == 0 {
            return Err(ApiError::Config("TF_DB_POOL_SIZE must be positive".into()));
        }
        if cli.store_retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(ApiError::Config(format!(
                "TF_STORE_RETRY_BACKOFF_MS must be at most {MAX_RETRY_BACKOFF_MS}"
            )));
        }

        let cache_ttl = Some(Duration::from_millis(cli.match_cache_ttl_ms))
            .filter(|ttl| !ttl.is_zero());

        Ok(Self {
            store: cli.store,
            database_url,
            db_pool_size: cli.db_pool_size,
            port: cli.port,
            cors_origins,
            matching: MatchingServiceConfig {
                cache_ttl,
                store_retry_backoff: Duration::from_millis(cli.store_retry_backoff_ms),
            },
            metrics_port: Some(cli.metrics_port).filter(|port| *port != 0),
        })
    }

    pub fn for_tests() -> Self {
        Self {
            store: StoreKind::Memory,
            database_url: None,
            db_pool_size: 1,
            port: 3000,
            cors_origins: vec!["http://localhost:3000".into()],
            matching: MatchingServiceConfig {
                store_retry_backoff: Duration::from_millis(1),
                ..Default::default()
            },
            metrics_port: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub matching: MatchingService,
    pub config: AppConfig,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn MatchStore>, config: AppConfig) -> Self {
        Self {
            matching: MatchingService::new(store, config.matching.clone()),
            config,
            readiness: Arc::new(AtomicBool::new(true)),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    error::with_request_id(request_id, next.run(req)).await
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let api_routes = Router::new()
        .route("/projects/:project_id/matches", get(matches::list_matches))
        .route("/matching/invalidate", post(cache::invalidate));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        .layer(cors)
        .with_state(state)
}

/// State over the given store with test-friendly settings (1 ms retry backoff,
/// default cache TTL).
pub fn test_state(store: Arc<dyn MatchStore>) -> SharedState {
    Arc::new(AppState::new(store, AppConfig::for_tests()))
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn MatchStore>, ApiError> {
    match config.store {
        StoreKind::Memory => {
            info!("using seeded in-memory store");
            Ok(Arc::new(MemoryStore::demo()))
        }
        StoreKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| ApiError::Config("DATABASE_URL is not set".into()))?;
            let pool = create_pool_from_url_checked(url, config.db_pool_size)
                .await
                .map_err(|err| ApiError::ServiceUnavailable(format!("failed to create pool: {err}")))?;
            Ok(Arc::new(PgMatchStore::new(pool)))
        }
    }
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));

    let config = AppConfig::from_cli(Cli::parse())?;

    if let Some(port) = config.metrics_port {
        tf_metrics::init_metrics(port);
    }

    let store = build_store(&config).await?;
    let state = Arc::new(AppState::new(store, config.clone()));

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        store = ?config.store,
        cache_ttl_ms = config.matching.cache_ttl.map(|ttl| ttl.as_millis() as u64),
        "tf-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);
    info!("shutdown requested, draining");

    // readyz reports 503 during this window
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tf-api"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn memory_store_needs_no_database() {
        let config = AppConfig::from_cli(parse(&["--store", "memory"])).unwrap();

        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.matching.cache_ttl, Some(Duration::from_secs(3)));
        assert_eq!(config.matching.store_retry_backoff, Duration::from_millis(100));
        assert_eq!(config.metrics_port, Some(9100));
    }

    #[test]
    fn postgres_requires_database_url() {
        if std::env::var_os("DATABASE_URL").is_none() {
            let err = AppConfig::from_cli(parse(&["--store", "postgres"])).unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        }

        let ok = AppConfig::from_cli(parse(&[
            "--store",
            "postgres",
            "--database-url",
            "postgres://u:p@localhost/talentflow",
        ]));
        assert!(ok.is_ok());
    }

    #[test]
    fn rejects_wildcard_cors_and_oversized_backoff() {
        assert!(AppConfig::from_cli(parse(&["--store", "memory", "--cors-origins", "*"])).is_err());
        assert!(AppConfig::from_cli(parse(&[
            "--store",
            "memory",
            "--store-retry-backoff-ms",
            "60000"
        ]))
        .is_err());
    }

    #[test]
    fn zero_disables_cache_and_metrics() {
        let config = AppConfig::from_cli(parse(&[
            "--store",
            "memory",
            "--match-cache-ttl-ms",
            "0",
            "--metrics-port",
            "0",
        ]))
        .unwrap();

        assert_eq!(config.matching.cache_ttl, None);
        assert_eq!(config.metrics_port, None);
    }
}
