use dotenv::dotenv;
use std::env;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::sqlite::SqlitePool;

#[cfg(test)]
use fake::Dummy;

/// A single recorded block of time. `id` is the sqlite rowid and is assigned
/// on insert; ids arriving in request payloads are ignored.
///
/// `end_time` is not required to be later than `start_time`.
/// TODO: decide whether reversed intervals should be rejected at the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[cfg_attr(test, derive(Dummy))]
pub struct TimeEntry {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

/// Field-wise delta for a partial update. An absent field leaves the stored
/// value alone; `"notes": null` clears the notes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeEntryPatch {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "nullable_field")]
    pub notes: Option<Option<String>>,
}

// Keeps an explicit JSON null distinguishable from a missing key.
fn nullable_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub async fn setup_pool() -> Result<SqlitePool> {
    dotenv().ok();
    let db_url = env::var("DATABASE_URL").context("DATABASE_URL env var must be set!")?;

    Ok(SqlitePool::connect(&db_url).await?)
}

pub async fn setup_db(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS time_entries(
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            notes TEXT)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn read_entry(pool: &SqlitePool, id: i64) -> Result<Option<TimeEntry>> {
    Ok(sqlx::query_as::<_, TimeEntry>(
        "SELECT id, date, start_time, end_time, notes FROM time_entries WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

// Newest day first; entries sharing a date keep insertion order.
pub async fn read_all_entries(pool: &SqlitePool) -> Result<Vec<TimeEntry>> {
    Ok(sqlx::query_as::<_, TimeEntry>(
        "SELECT id, date, start_time, end_time, notes FROM time_entries
        ORDER BY date DESC, id ASC",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn write_entry(pool: &SqlitePool, entry: &TimeEntry) -> Result<i64> {
    let done = sqlx::query(
        "INSERT INTO time_entries(date, start_time, end_time, notes) VALUES(?, ?, ?, ?)",
    )
    .bind(entry.date)
    .bind(entry.start_time)
    .bind(entry.end_time)
    .bind(entry.notes.as_deref())
    .execute(pool)
    .await?;

    Ok(done.last_insert_rowid())
}

pub async fn update_entry(pool: &SqlitePool, id: i64, entry: &TimeEntry) -> Result<bool> {
    let done = sqlx::query(
        "UPDATE time_entries SET date=?, start_time=?, end_time=?, notes=?
        WHERE id=?",
    )
    .bind(entry.date)
    .bind(entry.start_time)
    .bind(entry.end_time)
    .bind(entry.notes.as_deref())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(done.rows_affected() > 0)
}

pub async fn patch_entry(
    pool: &SqlitePool,
    id: i64,
    patch: &TimeEntryPatch,
) -> Result<Option<TimeEntry>> {
    let mut entry = match read_entry(pool, id).await? {
        Some(entry) => entry,
        None => return Ok(None),
    };

    if let Some(date) = patch.date {
        entry.date = date;
    }
    if let Some(start_time) = patch.start_time {
        entry.start_time = start_time;
    }
    if let Some(end_time) = patch.end_time {
        entry.end_time = end_time;
    }
    if let Some(notes) = &patch.notes {
        entry.notes = notes.clone();
    }

    update_entry(pool, id, &entry).await?;

    Ok(Some(entry))
}

pub async fn delete_entry(pool: &SqlitePool, id: i64) -> Result<bool> {
    let done = sqlx::query("DELETE FROM time_entries WHERE id=?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(done.rows_affected() > 0)
}
