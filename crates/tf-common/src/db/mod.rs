pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;
pub mod util;

pub use memory::MemoryStore;
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
pub use postgres::PgMatchStore;
pub use store::{MatchStore, StoreError};
