// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! SQLite data source: pool setup, seeding and the item query.

use crate::config::DataSourceConfig;
use fanout_core::Item;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Rows inserted by [`reset_and_seed`], in insertion order.
pub const SEED_ITEMS: [&str; 3] = ["Crab", "Octopus", "Lobster"];

/// Open a connection pool for `config.url`.
///
/// In-memory databases live only as long as their connection, so they get a
/// single connection that is never recycled.
pub async fn connect(config: &DataSourceConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    let pool = if is_in_memory(&config.url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?
    };

    info!(url = %config.url, "Data source pool opened");
    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Drop and recreate the `items` table with the seed rows.
pub async fn reset_and_seed(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DROP TABLE IF EXISTS items")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")
        .execute(&mut *tx)
        .await?;
    for name in SEED_ITEMS {
        sqlx::query("INSERT INTO items (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(rows = SEED_ITEMS.len(), "Seeded items table");
    Ok(())
}

/// Read every item, ordered by id.
///
/// The pooled connection is returned to the pool when `conn` drops, on the
/// success and the error path alike.
pub async fn fetch_items(pool: &SqlitePool) -> Result<Vec<Item>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM items ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| Item { id, name })
        .collect())
}
