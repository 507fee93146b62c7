use crate::decoy::DecoyPage;
use crate::handlers;
use crate::recorder::Recorder;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use honeypot_core::config::CorsConfig;
use honeypot_core::{HoneypotConfig, HoneypotError, IpResolver, Result};
use honeypot_store::VisitStore;
use http::Method;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state for the honeypot routes.
pub struct AppState {
    pub recorder: Recorder,
    pub decoy: DecoyPage,
    pub log_path: String,
    pub max_body_bytes: usize,
    pub cors: CorsConfig,
}

impl AppState {
    pub fn new(
        config: &HoneypotConfig,
        store: Arc<dyn VisitStore>,
        decoy: DecoyPage,
    ) -> Result<Self> {
        if !config.capture.log_path.starts_with('/') {
            return Err(HoneypotError::Config(format!(
                "capture.log_path must start with '/', got {:?}",
                config.capture.log_path
            )));
        }
        let resolver = IpResolver::standard(config.capture.trust_proxy);
        Ok(Self {
            recorder: Recorder::new(store, resolver, config.capture.user_agent_summary_chars),
            decoy,
            log_path: config.capture.log_path.clone(),
            max_body_bytes: config.server.max_body_bytes,
            cors: config.cors.clone(),
        })
    }

    /// Load the decoy page named in the config (or the embedded one) and
    /// build the state around `store`.
    pub fn from_config(config: &HoneypotConfig, store: Arc<dyn VisitStore>) -> Result<Self> {
        let decoy = DecoyPage::load(config.capture.decoy_page.as_deref())?;
        Self::new(config, store, decoy)
    }
}

/// `POST <log_path>` records; everything else, any method, gets the decoy.
pub fn build_router(state: Arc<AppState>) -> Router {
    let recorder_route = post(handlers::visit::record_visit)
        .fallback(handlers::decoy::serve_decoy)
        .layer(DefaultBodyLimit::max(state.max_body_bytes));

    Router::new()
        .route(&state.log_path, recorder_route)
        .fallback(handlers::decoy::serve_decoy)
        .layer(cors_layer(&state.cors))
        .with_state(state)
}

/// Any origin is accepted. With credentials on, a literal `*` is not allowed
/// alongside `access-control-allow-credentials`, so the request origin is
/// echoed back instead.
fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let methods: Vec<Method> = cfg
        .allow_methods
        .iter()
        .filter_map(|m| match m.to_ascii_uppercase().parse::<Method>() {
            Ok(method) => Some(method),
            Err(_) => {
                warn!(method = %m, "Ignoring unknown CORS method");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(methods);
    if cfg.allow_credentials {
        layer
            .allow_origin(AllowOrigin::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        layer.allow_origin(Any).allow_headers(Any)
    }
}

/// Bind and serve until `shutdown` resolves.
pub async fn start(
    config: &HoneypotConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;

    info!(addr = %local, "Honeypot listening");
    info!(
        store = %state.recorder.store().describe(),
        log_path = %state.log_path,
        "Visits will be appended to the store"
    );
    info!("All other routes serve the decoy page");
    info!(trust_proxy = config.capture.trust_proxy, "Proxy trust");

    let app = build_router(Arc::clone(&state));
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;

    // let queued appends land before the runtime goes away
    state.recorder.drain(DRAIN_TIMEOUT).await;

    info!("Honeypot stopped");
    Ok(())
}
