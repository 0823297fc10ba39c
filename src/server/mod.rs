//! HTTP front end: maps inbound links to rendered interstitial pages.

use crate::amazon::{Asin, AsinExtractor};
use crate::config::Config;
use crate::render::PageRenderer;
use crate::resolver::ProductResolver;
use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<AsinExtractor>,
    pub resolver: Arc<ProductResolver>,
    pub renderer: Arc<PageRenderer>,
    /// Upper bound for resolving one request.
    pub deadline: Duration,
}

impl AppState {
    pub fn new(
        extractor: AsinExtractor,
        resolver: ProductResolver,
        renderer: PageRenderer,
        deadline: Duration,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            resolver: Arc::new(resolver),
            renderer: Arc::new(renderer),
            deadline,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let short_links = config.short_links().context("Invalid short link table")?;
        let resolver = ProductResolver::from_config(config)?;
        info!("Resolver sources: {}", resolver.source_names().join(" -> "));

        Ok(Self::new(
            AsinExtractor::new(short_links),
            resolver,
            PageRenderer::new(config.region, config.partner_tag.clone(), config.redirect_delay_secs),
            config.request_deadline(),
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LinkQuery {
    pub url: Option<String>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/go", get(go_root))
        .route("/go/{*path}", get(go_path))
        .fallback(any_path)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Binds `bind_addr` and serves until Ctrl-C or SIGTERM.
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

type LinkQueryResult = Result<Query<LinkQuery>, QueryRejection>;

/// Unparseable input (repeated `url` keys, invalid UTF-8) counts as "no ASIN".
fn link_query(query: LinkQueryResult) -> Option<LinkQuery> {
    match query {
        Ok(Query(query)) => Some(query),
        Err(e) => {
            debug!("Rejected query string: {}", e);
            None
        }
    }
}

async fn go_root(State(state): State<AppState>, query: LinkQueryResult) -> Response {
    let asin = link_query(query).and_then(|q| state.extractor.extract(None, q.url.as_deref()));
    respond(&state, asin).await
}

async fn go_path(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: LinkQueryResult,
) -> Response {
    let asin = match (path, link_query(query)) {
        (Ok(Path(path)), Some(q)) => state.extractor.extract(Some(&path), q.url.as_deref()),
        (Err(e), _) => {
            debug!("Rejected path: {}", e);
            None
        }
        (Ok(_), None) => None,
    };
    respond(&state, asin).await
}

async fn any_path(State(state): State<AppState>, uri: Uri, query: LinkQueryResult) -> Response {
    let asin =
        link_query(query).and_then(|q| state.extractor.extract(Some(uri.path()), q.url.as_deref()));
    respond(&state, asin).await
}

async fn respond(state: &AppState, asin: Option<Asin>) -> Response {
    let Some(asin) = asin else {
        debug!("No ASIN in request");
        return (StatusCode::NOT_FOUND, Html(state.renderer.render_not_found())).into_response();
    };

    match tokio::time::timeout(state.deadline, state.resolver.resolve(&asin)).await {
        Ok(record) => Html(state.renderer.render(&record)).into_response(),
        Err(_) => {
            warn!("Resolving {} exceeded {:?}, serving minimal page", asin, state.deadline);
            Html(state.renderer.render_minimal(&asin)).into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Received shutdown signal, starting graceful shutdown");
}
