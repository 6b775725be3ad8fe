pub mod migrations;
pub mod pool;
pub mod shortlists;
pub mod util;

/// Storage error enum with the pool/postgres variants every store shares, plus extra variants.
macro_rules! db_error {
    ($name:ident { $($variants:tt)* }) => {
        #[derive(Debug, thiserror::Error)]
        pub enum $name {
            #[error("failed to get postgres connection: {0}")]
            Pool(#[from] deadpool_postgres::PoolError),
            #[error("postgres error: {0}")]
            Postgres(#[from] tokio_postgres::Error),
            $($variants)*
        }
    };
}

pub(crate) use db_error;

pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, PoolSettings, create_pool, create_pool_from_url};
pub use shortlists::{PgShortlistStore, ShortlistStorageError};
