mod auth;
mod background;
mod handlers;
mod openapi;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use clap::{ArgGroup, Parser};
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dataweb_core::labels::{LabelTable, parse_label_override};
use dataweb_core::projector::StatusFeedProjector;
use dataweb_core::provider::{FeedProvider, FileProvider, HttpProvider};

use auth::AccessLogLayer;
use openapi::ApiDoc;
use state::{SharedProvider, SharedState, WebAppInner};

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(
    name = "dataweb-web",
    about = "Instrument dashboard web server",
    version = dataweb_core::VERSION,
    group(ArgGroup::new("feed").required(true).args(["feed_url", "feed_file"]))
)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:60000", env = "DATAWEB_LISTEN")]
    listen: String,

    /// URL of the block server JSON feed.
    #[arg(long, env = "DATAWEB_FEED_URL")]
    feed_url: Option<String>,

    /// Path to a feed JSON file, re-read on every poll.
    #[arg(long, env = "DATAWEB_FEED_FILE")]
    feed_file: Option<PathBuf>,

    /// Poll interval in seconds.
    #[arg(long, default_value = "5", env = "DATAWEB_INTERVAL")]
    interval: u64,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value = "5", env = "DATAWEB_TIMEOUT")]
    timeout: u64,

    /// Instrument name shown in the page heading.
    #[arg(long, default_value = "DEMO", env = "DATAWEB_INSTRUMENT")]
    instrument: String,

    /// Extra or replacement PV label, as KEY=Label. Repeatable.
    #[arg(long = "label", value_name = "KEY=LABEL", value_parser = parse_label_override)]
    labels: Vec<(String, String)>,

    /// Basic Auth username. If set, --auth-password is also required.
    #[arg(long, env = "DATAWEB_AUTH_USER", requires = "auth_password")]
    auth_user: Option<String>,

    /// Basic Auth password.
    #[arg(long, env = "DATAWEB_AUTH_PASSWORD", requires = "auth_user")]
    auth_password: Option<String>,
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dataweb_web=info")),
        )
        .init();

    if args.interval == 0 {
        error!("--interval must be at least 1 second");
        process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };
    runtime.block_on(async_main(args));
}

async fn async_main(args: Args) {
    let provider = create_provider(&args);
    info!(
        version = dataweb_core::VERSION,
        source = %provider.describe(),
        interval_s = args.interval,
        "starting dashboard poller"
    );
    let provider: SharedProvider = Arc::new(Mutex::new(provider));

    let projector = StatusFeedProjector::new(LabelTable::default().with_overrides(args.labels));

    let (tx, _rx) = broadcast::channel(16);

    let state: SharedState = Arc::new(Mutex::new(WebAppInner::new(
        args.instrument.clone(),
        args.interval,
    )));

    {
        let state_clone = state.clone();
        let tx_clone = tx.clone();
        let interval = Duration::from_secs(args.interval);
        tokio::spawn(async move {
            background::tick_loop(state_clone, tx_clone, provider, projector, interval).await;
        });
    }

    // Basic Auth
    let auth_creds: Option<auth::Credentials> = match (args.auth_user, args.auth_password) {
        (Some(user), Some(pass)) => {
            info!("basic auth enabled");
            Some(Arc::new((user, pass)))
        }
        _ => None,
    };

    // Router
    let mut app = Router::new()
        .route("/", get(handlers::serve_page))
        .route("/api/v1/health", get(handlers::handle_health))
        .route("/api/v1/dashboard", get(handlers::handle_dashboard))
        .route("/api/v1/stream", get(handlers::handle_stream))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state((state, tx));

    if let Some(creds) = auth_creds {
        app = app.layer(axum::middleware::from_fn_with_state(
            creds,
            auth::basic_auth_middleware,
        ));
    }

    // Outermost of the three so the log sees the final status and the AuthUser
    // the auth middleware attaches to the response
    // (axum layers: last .layer() = outermost; request flows outside-in)
    let app = app
        .layer(AccessLogLayer)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new());

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    let addr: SocketAddr = match args.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(listen = %args.listen, error = %e, "invalid listen address");
            process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        process::exit(1);
    }
}

fn create_provider(args: &Args) -> Box<dyn FeedProvider + Send> {
    match (&args.feed_url, &args.feed_file) {
        (Some(url), _) => Box::new(HttpProvider::new(
            url.clone(),
            Duration::from_secs(args.timeout),
        )),
        (None, Some(path)) => Box::new(FileProvider::new(path.clone())),
        // clap's `feed` group requires one of the two
        (None, None) => unreachable!("feed source is required"),
    }
}
