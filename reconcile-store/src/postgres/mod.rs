//! `sqlx::PgPool`-backed implementation of the store traits, enabled by
//! the `postgres-store` feature. SQL text is adapted directly from the
//! original Go repository layer (`internal/repository/*.go`), extended
//! with a child table for per-bank-file job tracking (SPEC_FULL.md §9
//! Decision 3) in place of the original's single aggregate column.

mod ingestion_job;
mod reconciliation;
mod transaction;
mod workflow;

use sqlx::PgPool;

/// Shared handle passed to every trait impl in this module.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
