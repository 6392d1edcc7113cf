use crate::codec::{parse_idents, parse_pairs, render, Format};
use crate::error::Result;
use crate::state::AppState;
use aliases_core::{IdentAlias, KvStore};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AliasQuery {
    /// Any non-empty value looks aliases up instead of assigning them.
    #[serde(default)]
    pub ro: Option<String>,
}

impl AliasQuery {
    fn read_only(&self) -> bool {
        self.ro.as_deref().is_some_and(|ro| !ro.is_empty())
    }
}

pub async fn assign_aliases<S: KvStore>(
    Path(name): Path<String>,
    Query(query): Query<AliasQuery>,
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let format = Format::from_headers(&headers);
    let batch = IdentAlias::batch(parse_idents(format, &body)?);
    let definition = state.registry().get(&name).await?;

    let result = if query.read_only() {
        state.store().lookup(&definition, batch).await?
    } else {
        state.store().assign(&definition, batch).await?
    };

    Ok(render(format, result))
}

pub async fn put_aliases<S: KvStore>(
    Path(name): Path<String>,
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let pairs = parse_pairs(Format::from_headers(&headers), &body)?;
    let definition = state.registry().get(&name).await?;
    state.store().put(&definition, &pairs).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_aliases<S: KvStore>(
    Path(name): Path<String>,
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let idents = parse_idents(Format::from_headers(&headers), &body)?;
    let definition = state.registry().get(&name).await?;
    state.store().delete(&definition, idents.as_slice()).await?;
    Ok(StatusCode::NO_CONTENT)
}
