use super::error::ApiError;
use super::protocol::*;
use super::types::{Film, FilmFields, FilmId};
use crate::app::AppContext;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Extension, Path};
use axum::http::StatusCode;

/// A path segment axum cannot decode (e.g. invalid UTF-8) is an invalid id too.
fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<FilmId, ApiError> {
    let Path(raw) = path.map_err(|rejection| ApiError::InvalidId {
        raw: rejection.body_text(),
    })?;
    raw.parse().map_err(|_| ApiError::InvalidId { raw })
}

fn parse_fields(body: Result<Bytes, BytesRejection>) -> Result<FilmFields, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::BodyTooLarge {
                limit: MAX_BODY_BYTES,
            }
        } else {
            ApiError::InvalidBody {
                reason: rejection.body_text(),
            }
        }
    })?;
    FilmFields::from_json(&body).map_err(|e| ApiError::InvalidBody {
        reason: e.to_string(),
    })
}

pub async fn handle_list_films(
    Extension(ctx): Extension<AppContext>,
) -> Result<Json<Vec<Film>>, ApiError> {
    let films = ctx
        .store
        .list()
        .await
        .map_err(|e| ApiError::from_store(e, MSG_LIST_FAILED))?;

    tracing::info!(count = films.len(), "Films listed");
    Ok(Json(films))
}

pub async fn handle_get_film(
    Extension(ctx): Extension<AppContext>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Film>, ApiError> {
    let id = parse_id(raw_id)?;

    let film = ctx
        .store
        .get(id)
        .await
        .map_err(|e| ApiError::from_store(e, MSG_GET_FAILED))?;

    tracing::info!(film_id = film.id, "Film fetched");
    Ok(Json(film))
}

pub async fn handle_create_film(
    Extension(ctx): Extension<AppContext>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Film>, ApiError> {
    let fields = parse_fields(body)?;

    let film = ctx
        .store
        .create(fields)
        .await
        .map_err(|e| ApiError::from_store(e, MSG_CREATE_FAILED))?;

    tracing::info!(
        film_id = film.id,
        title = %film.title,
        year = film.year,
        filmtype = %film.filmtype,
        "Film added"
    );
    Ok(Json(film))
}

pub async fn handle_update_film(
    Extension(ctx): Extension<AppContext>,
    raw_id: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Film>, ApiError> {
    let id = parse_id(raw_id)?;
    let fields = parse_fields(body)?;

    let film = ctx
        .store
        .update(id, fields)
        .await
        .map_err(|e| ApiError::from_store(e, MSG_UPDATE_FAILED))?;

    tracing::info!(
        film_id = film.id,
        title = %film.title,
        year = film.year,
        filmtype = %film.filmtype,
        "Film updated"
    );
    Ok(Json(film))
}

pub async fn handle_delete_film(
    Extension(ctx): Extension<AppContext>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<&'static str, ApiError> {
    let id = parse_id(raw_id)?;

    ctx.store
        .delete(id)
        .await
        .map_err(|e| ApiError::from_store(e, MSG_DELETE_FAILED))?;

    tracing::info!(film_id = id, "Film deleted");
    Ok(MSG_DELETED)
}
