use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use aj_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use aj_common::matching::{DEFAULT_PARALLEL_MIN_POSTINGS, MatchingEngine, MatchingEngineConfig};
use axum::{
    Router,
    body::Body,
    extract::connect_info::ConnectInfo,
    extract::{DefaultBodyLimit, State},
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
    http::{Method, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod auth;
pub mod error;
pub mod handlers;

use auth::{API_KEY_HEADER, AuthConfig};
use error::ApiError;
use handlers::{health, matches};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const REQUEST_ID_HEADER: &str = "x-request-id";
const RATE_LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Parser)]
#[command(name = "aj-api", about = "HTTP API for ranking job postings against a profile")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3002)]
    port: u16,

    /// API key required in X-API-Key on /api routes (open when unset)
    #[arg(long, env = "AJ_API_KEY")]
    api_key: Option<String>,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "AJ_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "AJ_API_MAX_BODY_BYTES", default_value_t = 2 * 1024 * 1024)]
    max_body_bytes: usize,

    /// Maximum postings accepted in a single match request
    #[arg(long, env = "AJ_API_MAX_POSTINGS", default_value_t = 5000)]
    max_postings: usize,

    /// Batches at least this large are scored in parallel (0 disables)
    #[arg(long, env = "AJ_MATCH_PARALLEL_MIN_POSTINGS", default_value_t = DEFAULT_PARALLEL_MIN_POSTINGS)]
    parallel_min_postings: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub max_body_bytes: usize,
    pub max_postings: usize,
    pub engine: MatchingEngineConfig,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "AJ_CORS_ORIGINS must list explicit origins".into(),
            ));
        }
        if cli.max_body_bytes == 0 {
            return Err(ApiError::BadRequest(
                "AJ_API_MAX_BODY_BYTES must be positive".into(),
            ));
        }
        if cli.max_postings == 0 {
            return Err(ApiError::BadRequest(
                "AJ_API_MAX_POSTINGS must be positive".into(),
            ));
        }

        Ok(Self {
            port: cli.port,
            cors_origins,
            auth: AuthConfig {
                api_key: cli.api_key.filter(|key| !key.is_empty()),
            },
            max_body_bytes: cli.max_body_bytes,
            max_postings: cli.max_postings,
            engine: MatchingEngineConfig {
                parallel_min_postings: cli.parallel_min_postings,
            },
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            port: 3002,
            cors_origins: vec!["http://localhost:3000".into()],
            auth,
            max_body_bytes: 256 * 1024,
            max_postings: 100,
            engine: MatchingEngineConfig::default(),
        }
    }
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u32,
    pub burst: u32,
}

impl RateLimitConfig {
    fn parse_env_u32(name: &str) -> Option<u32> {
        env::var(name)
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
    }

    pub fn from_env() -> Self {
        Self {
            per_sec: Self::parse_env_u32("AJ_RATE_LIMIT_PER_SEC").unwrap_or(20),
            burst: Self::parse_env_u32("AJ_RATE_LIMIT_BURST").unwrap_or(40),
        }
    }
}

fn build_ip_limiter(config: &RateLimitConfig) -> Arc<IpRateLimiter> {
    let per_sec = NonZeroU32::new(config.per_sec).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::keyed(Quota::per_second(per_sec).allow_burst(burst)))
}

/// Drops per-IP entries whose quota has fully replenished. Returns the keys left.
fn prune_ip_limiter(limiter: &IpRateLimiter) -> usize {
    limiter.retain_recent();
    limiter.shrink_to_fit();
    limiter.len()
}

fn spawn_ip_limiter_pruner(limiter: Arc<IpRateLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RATE_LIMITER_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            let tracked = prune_ip_limiter(&limiter);
            tracing::debug!(tracked, "pruned rate limiter state");
        }
    });
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: MatchingEngine,
    pub(crate) rate_limiter: Arc<IpRateLimiter>,
    pub readiness: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: AppConfig, rate_limits: &RateLimitConfig) -> Self {
        Self {
            engine: MatchingEngine::new(config.engine.clone()),
            config,
            rate_limiter: build_ip_limiter(rate_limits),
            readiness: Arc::new(AtomicBool::new(true)),
        }
    }
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
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
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

async fn global_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(client_ip) = request_ip(&req) {
        if state.rate_limiter.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests("rate limit exceeded".into()));
        }
    }

    Ok(next.run(req).await)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".into())
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    error::with_request_id(request_id, next.run(req)).await
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let api_routes = Router::new().route("/match-jobs", post(matches::match_jobs));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        .layer(cors)
        .with_state(state)
}

pub fn test_state(api_key: Option<&str>) -> SharedState {
    let auth = AuthConfig {
        api_key: api_key.map(str::to_string),
    };

    Arc::new(AppState::new(
        AppConfig::for_tests(auth),
        &RateLimitConfig {
            per_sec: 1000,
            burst: 1000,
        },
    ))
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let config = AppConfig::from_cli(Cli::parse())?;
    let state = Arc::new(AppState::new(config.clone(), &RateLimitConfig::from_env()));
    spawn_ip_limiter_pruner(state.rate_limiter.clone());

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        api_key_required = config.auth.api_key.is_some(),
        parallel_min_postings = config.engine.parallel_min_postings,
        "aj-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
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
        use tokio::signal::unix::{SignalKind, signal};
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

    info!("shutdown signal received; draining");
    state.readiness.store(false, Ordering::SeqCst);

    // Let load balancers observe /readyz failing before connections stop.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pruning_drops_replenished_client_entries() {
        let limiter = build_ip_limiter(&RateLimitConfig {
            per_sec: 1000,
            burst: 1,
        });
        let client: IpAddr = [10, 0, 0, 7].into();

        assert!(limiter.check_key(&client).is_ok());
        assert_eq!(limiter.len(), 1);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(prune_ip_limiter(&limiter), 0);
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["aj-api"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn config_parses_cors_origins() {
        let config = AppConfig::from_cli(cli(&[
            "--cors-origins",
            "http://a.example, http://b.example,",
        ]))
        .unwrap();

        assert_eq!(
            config.cors_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
    }

    #[test]
    fn config_rejects_wildcard_origin() {
        let result = AppConfig::from_cli(cli(&["--cors-origins", "*"]));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn config_rejects_zero_limits() {
        let result = AppConfig::from_cli(cli(&["--max-postings", "0"]));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn config_carries_engine_threshold() {
        let config = AppConfig::from_cli(cli(&["--parallel-min-postings", "0"])).unwrap();
        assert_eq!(config.engine, MatchingEngineConfig::sequential());
    }

    #[test]
    fn rate_limiter_rejects_after_burst() {
        let limiter = build_ip_limiter(&RateLimitConfig {
            per_sec: 1,
            burst: 2,
        });
        let ip: IpAddr = [10, 0, 0, 1].into();

        assert!(limiter.check_key(&ip).is_ok());
        assert!(limiter.check_key(&ip).is_ok());
        assert!(limiter.check_key(&ip).is_err());
    }
}
