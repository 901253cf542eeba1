use std::convert::Infallible;

use serde_json::json;
use sqlx::sqlite::SqlitePool;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::Filter;

use crate::db::{self, TimeEntry, TimeEntryPatch};

fn json_body_entry() -> impl Filter<Extract = (TimeEntry,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(1024 * 16).and(warp::body::json())
}

fn json_body_patch() -> impl Filter<Extract = (TimeEntryPatch,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(1024 * 16).and(warp::body::json())
}

fn with_pool(
    pool: SqlitePool,
) -> impl Filter<Extract = (SqlitePool,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

// Filters
pub fn list_entries(
    pool: SqlitePool,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("timeentries")
        .and(warp::get())
        .and(with_pool(pool))
        .and_then(list_entries_handler)
}

pub fn post_entry(
    pool: SqlitePool,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("timeentries")
        .and(warp::post())
        .and(json_body_entry())
        .and(with_pool(pool))
        .and_then(new_entry)
}

pub fn get_entry(
    pool: SqlitePool,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("timeentries" / i64)
        .and(warp::get())
        .and(with_pool(pool))
        .and_then(read_entry)
}

pub fn put_entry(
    pool: SqlitePool,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("timeentries" / i64)
        .and(warp::put())
        .and(json_body_entry())
        .and(with_pool(pool))
        .and_then(update_entry_handler)
}

pub fn patch_entry(
    pool: SqlitePool,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("timeentries" / i64)
        .and(warp::patch())
        .and(json_body_patch())
        .and(with_pool(pool))
        .and_then(patch_entry_handler)
}

pub fn delete_entry(
    pool: SqlitePool,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("timeentries" / i64)
        .and(warp::delete())
        .and(with_pool(pool))
        .and_then(delete_entry_handler)
}

fn not_found() -> Response {
    warp::reply::with_status(
        warp::reply::json(&json!({ "detail": "Not found." })),
        StatusCode::NOT_FOUND,
    )
    .into_response()
}

fn store_error(err: anyhow::Error) -> Response {
    tracing::error!("store error: {:?}", err);
    warp::reply::with_status(
        warp::reply::json(&json!({ "detail": err.to_string() })),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .into_response()
}

// Handlers
async fn list_entries_handler(pool: SqlitePool) -> Result<Response, Infallible> {
    match db::read_all_entries(&pool).await {
        Ok(entries) => Ok(warp::reply::json(&entries).into_response()),
        Err(e) => Ok(store_error(e)),
    }
}

async fn new_entry(entry: TimeEntry, pool: SqlitePool) -> Result<Response, Infallible> {
    match db::write_entry(&pool, &entry).await {
        Ok(id) => {
            let stored = TimeEntry {
                id: Some(id),
                ..entry
            };
            Ok(
                warp::reply::with_status(warp::reply::json(&stored), StatusCode::CREATED)
                    .into_response(),
            )
        }
        Err(e) => Ok(store_error(e)),
    }
}

async fn read_entry(id: i64, pool: SqlitePool) -> Result<Response, Infallible> {
    match db::read_entry(&pool, id).await {
        Ok(Some(entry)) => Ok(warp::reply::json(&entry).into_response()),
        Ok(None) => Ok(not_found()),
        Err(e) => Ok(store_error(e)),
    }
}

async fn update_entry_handler(
    id: i64,
    entry: TimeEntry,
    pool: SqlitePool,
) -> Result<Response, Infallible> {
    match db::update_entry(&pool, id, &entry).await {
        Ok(true) => {
            let stored = TimeEntry {
                id: Some(id),
                ..entry
            };
            Ok(warp::reply::json(&stored).into_response())
        }
        Ok(false) => Ok(not_found()),
        Err(e) => Ok(store_error(e)),
    }
}

async fn patch_entry_handler(
    id: i64,
    patch: TimeEntryPatch,
    pool: SqlitePool,
) -> Result<Response, Infallible> {
    match db::patch_entry(&pool, id, &patch).await {
        Ok(Some(entry)) => Ok(warp::reply::json(&entry).into_response()),
        Ok(None) => Ok(not_found()),
        Err(e) => Ok(store_error(e)),
    }
}

async fn delete_entry_handler(id: i64, pool: SqlitePool) -> Result<Response, Infallible> {
    match db::delete_entry(&pool, id).await {
        Ok(true) => {
            Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response())
        }
        Ok(false) => Ok(not_found()),
        Err(e) => Ok(store_error(e)),
    }
}
