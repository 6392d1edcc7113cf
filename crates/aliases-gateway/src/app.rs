use aliases_core::KvStore;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    assign_aliases, create_def, delete_aliases, delete_def, get_def, health_handler, list_defs,
    put_aliases, update_def,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router<S: KvStore>(state: AppState<S>) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/defs", get(list_defs::<S>).post(create_def::<S>))
            .route(
                "/defs/{name}",
                get(get_def::<S>)
                    .put(update_def::<S>)
                    .delete(delete_def::<S>),
            )
            .route(
                "/defs/{name}/aliases",
                post(assign_aliases::<S>)
                    .put(put_aliases::<S>)
                    .delete(delete_aliases::<S>),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
