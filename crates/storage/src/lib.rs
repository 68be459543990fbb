//! Persistence for ingested users: the [`UserStore`] capability, its PostgreSQL
//! and in-memory implementations, the transactional batch loader and the age
//! distribution aggregator.

pub mod aggregate;
pub mod error;
pub mod loader;
pub mod memory;
pub mod postgres;
pub mod store;

pub use aggregate::{
    calculate_distribution, render_report, AgeBucket, AgeDistribution, AggregateError,
    DistributionReport, AGE_BUCKETS,
};
pub use error::StoreError;
pub use loader::{load_records, LoadError, LoadProgress, DEFAULT_BATCH_SIZE};
pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;
pub use store::{StoredUser, UserStore};
