//! Implementations of the position store collaborator

pub mod config_file;
pub mod memory;

pub use config_file::ConfigFileStore;
pub use memory::MemoryStore;
