//! The data-repository layer (§4.3): narrow async traits per entity group,
//! an in-memory implementation used for tests and the default dev profile,
//! and a `sqlx::PgPool`-backed implementation gated behind the
//! `postgres-store` feature.

mod error;
mod memory;
#[cfg(feature = "postgres-store")]
mod postgres;
mod traits;

pub use error::StoreError;
pub use memory::InMemoryStore;
#[cfg(feature = "postgres-store")]
pub use postgres::PgStore;
pub use traits::{IngestionJobStore, ReconciliationStore, TransactionStore, WorkflowStore};
