mod basic;
mod occurrences;
mod predictions;

use axum::Router;
use common::config;
use logging::*;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

struct AppState {}

pub async fn run() {
    let log = DEFAULT.new(o!("function" => "web::run"));

    let state = Arc::new(AppState {});

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = add_routes(
        Router::new(),
        &[
            basic::add_route,
            occurrences::add_route,
            predictions::add_route,
        ],
    )
    .with_state(state)
    .layer(cors);

    let bind_addr = config::get("WEB_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3050".to_string());
    info!(log, "listening"; "bind_addr" => &bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}
