use crate::codec::{decode_json, DefPatch};
use crate::error::Result;
use crate::state::AppState;
use aliases_core::{Def, KvStore};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub async fn list_defs<S: KvStore>(State(state): State<AppState<S>>) -> Result<Json<Vec<Def>>> {
    Ok(Json(state.registry().list().await?))
}

pub async fn create_def<S: KvStore>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Def>)> {
    let def: Def = decode_json(&body)?;
    let created = state.registry().create(def).await?;
    Ok((StatusCode::CREATED, Json(created.into_def())))
}

pub async fn get_def<S: KvStore>(
    Path(name): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<Def>> {
    Ok(Json(state.registry().get(&name).await?.into_def()))
}

pub async fn update_def<S: KvStore>(
    Path(name): Path<String>,
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<StatusCode> {
    let patch: DefPatch = decode_json(&body)?;
    let current = state.registry().get(&name).await?;
    state
        .registry()
        .update(&name, patch.apply(current.into_def()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_def<S: KvStore>(
    Path(name): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<StatusCode> {
    state.registry().delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
