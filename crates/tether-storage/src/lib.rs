//! Record store implementations for Tether.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use tether_core::error::{Result, StorageError};
pub use tether_core::repository::{ReadRepository, Repository};
