use std::{
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, config, graphql, rest, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use http::{header, HeaderValue, Method};
use service::{
    infra::{mail, postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{self as log, Subscriber};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::writer::BoxMakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written into `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Configured maximum [`log::Level`], [`log::Level::INFO`] until the
/// [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    init_logging();

    _ = run().await;
}

/// Installs the `stdout` and `stderr` log writers.
fn init_logging() {
    tracing_subscriber::registry()
        .with(writer(false))
        .with(writer(true))
        .init();
}

/// Creates a log writer into `stderr` (for [`STDERR_LEVELS`]) or `stdout`
/// (for the rest), respecting the configured [`LOG_LEVEL`].
fn writer<S>(stderr: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let out = if stderr {
        BoxMakeWriter::new(io::stderr)
    } else {
        BoxMakeWriter::new(io::stdout)
    };

    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(out)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || STDERR_LEVELS.contains(meta.level()) == stderr
                    && max >= *meta.level()
        }))
}

/// Runs the houses server until it fails.
///
/// Every failure is logged before being returned.
async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;
    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;
    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut db = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to connect `Postgres`: {e}");
    })?;
    let report = migrations::runner().run_async(&mut db).await.map_err(|e| {
        log::error!("failed to migrate `houses` database: {e}");
    })?;
    for m in report.applied_migrations() {
        log::info!(migration = %m, "applied database migration");
    }

    let service = Service::new(service.into(), db, mail::Log);

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .merge(rest::router())
        .layer(Extension(Arc::new(api::schema())))
        .layer(Extension(service))
        .layer(cors(&server.cors)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    |r: &http::Response<_>,
                     took: time::Duration,
                     span: &log::Span| {
                        let status = r.status();
                        _ = span.record(
                            "http.status_code",
                            log::field::display(status.as_u16()),
                        );

                        let took = format!("{}ms", took.as_millis());
                        if status.is_server_error() {
                            log::error!(duration = took, "request failed");
                        } else if status.is_client_error() {
                            log::warn!(duration = took, "request rejected");
                        } else {
                            log::info!(duration = took, "request served");
                        }
                    },
                ),
        );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;
    log::info!("serving houses on `{addr}`");

    axum::serve(listener, app)
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Builds the [`CorsLayer`] for the REST and GraphQL endpoints.
///
/// A `*` among the configured origins allows any of them.
fn cors(conf: &config::Cors) -> Result<CorsLayer, ()> {
    let origins = if conf.origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        conf.origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    log::error!("`{o}` is not a valid CORS origin: {e}");
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(AllowOrigin::list)?
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            header::IF_MATCH,
            header::IF_NONE_MATCH,
        ])
        .expose_headers([header::ETAG, header::LOCATION]))
}

/// Creates the [`log::Span`] of a single HTTP request.
fn request_span<B>(r: &http::Request<B>) -> log::Span {
    let headers = r.headers();
    log::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(headers, r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.flavor = ?r.version(),
        http.host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok()),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.target = r
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = log::field::Empty,
    )
}
