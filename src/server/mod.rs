use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::gallery::VsCodeAdapter;

pub mod routes;

/// Server state
pub struct AppState {
    pub adapter: VsCodeAdapter,
}

/// Gallery routes, shared by the server and the tests
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/vscode/gallery/extensionquery", post(routes::extension_query))
        .route(
            "/vscode/asset/{namespace}/{extension}/{version}/{asset_type}",
            get(routes::get_asset),
        )
        .route(
            "/vscode/gallery/publishers/{namespace}/vsextensions/{extension}/{version}/vspackage",
            get(routes::get_vspackage),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(host: &str, port: u16, adapter: VsCodeAdapter) -> anyhow::Result<()> {
    let state = Arc::new(AppState { adapter });
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting gallery server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
