// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod backend;
pub mod gateway;
pub mod oracle_pool;
pub mod pool_key;
pub mod registry;

#[cfg(test)]
pub mod testing;

pub use backend::*;
pub use gateway::*;
pub use oracle_pool::OraclePoolFactory;
pub use registry::*;
