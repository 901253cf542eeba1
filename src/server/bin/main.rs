use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use warp::Filter;

use timeclock::api;
use timeclock::db;
use timeclock::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = telemetry::get_subscriber("timeclock", "info");
    telemetry::init_subscriber(subscriber);

    let pool = db::setup_pool().await?;
    db::setup_db(&pool).await?;
    run(pool).await;

    Ok(())
}

async fn run(pool: SqlitePool) {
    let routes = api::list_entries(pool.clone())
        .or(api::post_entry(pool.clone()))
        .or(api::get_entry(pool.clone()))
        .or(api::put_entry(pool.clone()))
        .or(api::patch_entry(pool.clone()))
        .or(api::delete_entry(pool.clone()));

    tracing::info!("listening on 0.0.0.0:3333");
    warp::serve(routes).run(([0, 0, 0, 0], 3333)).await;
}
