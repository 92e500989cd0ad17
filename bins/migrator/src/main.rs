//! Metadata store migration runner.
//!
//! Usage:
//!   migrator up      - Apply pending migrations (creates the `files` table)
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show applied and pending migrations
//!   migrator fresh   - Drop everything and re-apply
//!
//! The connection URL comes from `DATABASE_URL` (or `-u <url>`), optionally
//! via `.env`. The server does NOT read this variable: it takes
//! `database.url` from `AppConfig` (`LOCALCLOUD__DATABASE__URL`). Point both
//! at the same database, e.g. `DATABASE_URL=$LOCALCLOUD__DATABASE__URL migrator up`.

use localcloud_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own tracing subscriber
    cli::run_cli(Migrator).await;
}
