pub mod gateway;
pub mod memory;
pub mod postgres;
pub mod store;

pub use gateway::StoreGateway;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{DocumentStore, Store, StoreError};
