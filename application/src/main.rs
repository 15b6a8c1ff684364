use std::{io, sync::OnceLock, time};

use application::{config, Args, Config, Service};
use axum::{extract::MatchedPath, Router};
use axum_client_ip::InsecureClientIp;
use service::infra::{cache, postgres, Postgres};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// Log levels written to stderr instead of stdout.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum log level, known once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    let enabled = |meta: &log::Metadata<'_>, stderr: bool| {
        meta.is_span()
            || STDERR_LEVELS.contains(meta.level()) == stderr
                && LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO)
                    >= *meta.level()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(move |meta| enabled(meta, false))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(move |meta| enabled(meta, true))),
        )
        .init();

    _ = start().await;
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        cache,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let cache = session_cache(cache)?;
    let service = Service::new(service.into(), postgres, cache);

    let app = traced(application::router(service).layer(cors(server.cors)?));

    let addr = (server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("failed to listen on `{}:{}`: {e}", addr.0, addr.1);
    })?;
    log::info!("listening on `{}:{}`", addr.0, addr.1);

    axum::serve(listener, app).await.map_err(|e| {
        log::error!("webserver failed: {e}");
    })
}

/// Creates the session [`cache::Backend`] of the configured kind.
fn session_cache(conf: config::Cache) -> Result<cache::Backend, ()> {
    match conf.kind {
        config::CacheKind::Memory => {
            log::warn!("sessions are kept in memory of this instance only");
            Ok(cache::Memory::new().into())
        }
        config::CacheKind::Redis => cache::Redis::new(&conf.into())
            .map(Into::into)
            .map_err(|e| {
                log::error!("failed to initialize `Redis` client: {e}");
            }),
    }
}

/// Creates a [`CorsLayer`] allowing the configured origins.
fn cors(conf: config::Cors) -> Result<CorsLayer, ()> {
    let origins = if conf.origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            conf.origins
                .iter()
                .map(|origin| {
                    origin.parse::<http::HeaderValue>().map_err(|e| {
                        log::error!(
                            "`{origin}` is not a valid CORS origin: {e}",
                        );
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ])
        .allow_origin(origins))
}

/// Wraps every request to the provided [`Router`] into a span, logging its
/// outcome.
fn traced(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|r: &http::Request<_>| {
                log::info_span!(
                    "HTTP request",
                    http.client_ip = InsecureClientIp::from(
                        r.headers(),
                        r.extensions(),
                    )
                    .map(|ip| ip.0.to_string())
                    .ok(),
                    http.method = r.method().as_str(),
                    http.route = r
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str),
                    http.status_code = log::field::Empty,
                )
            })
            .on_response(
                |r: &http::Response<_>, dur: time::Duration, span: &log::Span| {
                    let status = r.status();
                    _ = span.record("http.status_code", status.as_u16());

                    let duration = format!("{}ms", dur.as_millis());
                    if status.is_client_error() || status.is_server_error() {
                        log::error!(duration = duration.as_str());
                    } else {
                        log::info!(duration = duration.as_str());
                    }
                },
            ),
    )
}
